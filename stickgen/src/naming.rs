/// Derive an identifier fragment from a template name: every character
/// outside `[A-Za-z0-9]` separates words, each word is capitalised, and the
/// words are joined. `layouts/base.html.twig` becomes `LayoutsBaseHtmlTwig`.
///
/// Names that differ only in punctuation map to the same fragment.
pub fn titleize(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// The Rust identifier used for a template local named `name`.
///
/// Every local gets the `l_` prefix, so no template name can shadow the
/// render function's parameters, the generator's `__`-prefixed temporaries
/// or a Rust keyword.
pub fn local_ident(name: &str) -> String {
    format!("l_{}", name)
}
