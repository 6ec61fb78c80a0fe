//! Translation of stored relative paths into public URLs.

/// Build the public URL for a stored path. Windows separators are
/// normalised and duplicate slashes at the join point are avoided.
pub fn public_url(base_url: &str, stored_path: &str) -> String {
    let path = stored_path.replace('\\', "/");
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches("./").trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_and_path() {
        assert_eq!(
            public_url("http://localhost:3000", "uploads/images/2025/03/09032025_ab12c.jpg"),
            "http://localhost:3000/uploads/images/2025/03/09032025_ab12c.jpg"
        );
    }

    #[test]
    fn normalises_backslashes_and_slashes() {
        assert_eq!(
            public_url("https://api.example.com/", "uploads\\test\\2025\\03\\week-2\\a.png"),
            "https://api.example.com/uploads/test/2025/03/week-2/a.png"
        );
        assert_eq!(
            public_url("http://h", "/public/processed-images/x.jpg"),
            "http://h/public/processed-images/x.jpg"
        );
    }
}
