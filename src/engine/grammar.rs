/// A well-formed `{{name}}` token located in template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub start: usize,
    pub end: usize,
    pub token: &'a str,
    pub inner: &'a str,
}

impl<'a> Placeholder<'a> {
    pub fn name(&self) -> &'a str {
        self.inner.trim()
    }
}

/// Scans left to right for `{{` + one or more non-`}` characters + `}}`.
/// Matches never overlap. Each byte is visited a bounded number of times, so
/// unclosed input scans in linear time.
pub struct Placeholders<'a> {
    text: &'a str,
    pos: usize,
}

pub fn placeholders(text: &str) -> Placeholders<'_> {
    Placeholders { text, pos: 0 }
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();

        while let Some(offset) = self.text[self.pos..].find("{{") {
            let start = self.pos + offset;
            let inner_start = start + 2;
            let inner_len = bytes[inner_start..]
                .iter()
                .take_while(|&&b| b != b'}')
                .count();
            let inner_end = inner_start + inner_len;

            if inner_end == bytes.len() {
                break;
            }

            if inner_len > 0 && bytes[inner_end..].starts_with(b"}}") {
                let end = inner_end + 2;
                self.pos = end;
                return Some(Placeholder {
                    start,
                    end,
                    token: &self.text[start..end],
                    inner: &self.text[inner_start..inner_end],
                });
            }

            // Every `{{` inside the failed run reaches the same `}` and fails
            // the same way, so resume at that `}`.
            self.pos = inner_end;
        }

        self.pos = self.text.len();
        None
    }
}
