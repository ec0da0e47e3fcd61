/// Derive a disposition name from a title.
///
/// Lowercases, maps every non-alphanumeric character to `-`, collapses runs
/// of `-` and trims them from both ends. Returns `None` when nothing is left.
pub fn slugify(title: &str) -> Option<String> {
    let mut slug = String::with_capacity(title.len());
    let mut prev_hyphen = true;
    for ch in title.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    (!slug.is_empty()).then_some(slug)
}
