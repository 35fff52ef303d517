/// Decorative heading used to fence generated blocks in an `.ini` file.
///
/// `open()` renders `<side> <title> <side>` and `close()` renders a rule of the
/// same width, so the pair can be located again with a regex on undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub title: String,
    side_len: usize,
    side_char: char,
}

impl Heading {
    pub fn new(title: impl Into<String>, side_len: usize, side_char: char) -> Self {
        Self {
            title: title.into(),
            side_len,
            side_char,
        }
    }

    fn side(&self) -> String {
        self.side_char.to_string().repeat(self.side_len)
    }

    pub fn open(&self) -> String {
        let side = self.side();
        format!("{side} {} {side}", self.title)
    }

    pub fn close(&self) -> String {
        self.side_char
            .to_string()
            .repeat(self.open().chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close_have_same_width() {
        let heading = Heading::new("GI Remap", 15, '-');
        assert_eq!(heading.open(), "--------------- GI Remap ---------------");
        assert_eq!(heading.close().len(), heading.open().len());
        assert!(heading.close().chars().all(|c| c == '-'));
    }

    #[test]
    fn test_retitle() {
        let mut heading = Heading::new("", 5, '*');
        heading.title = "RaidenBoss".to_string();
        assert_eq!(heading.open(), "***** RaidenBoss *****");
    }
}
