/// Indentation used for multi-valued annotation and property text.
const VALUE_INDENT: &str = "\n      ";
const VALUE_TERMINATOR: &str = "\n    ";

/// Whole-document annotation of the form `name=<indented values>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    text: String,
}

impl Annotation {
    pub fn new<I, S>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            text: format!("{}={}", name, indented_values(values)),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Joins values one per line, indented to sit inside a serialized element.
pub fn indented_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for value in values {
        text.push_str(VALUE_INDENT);
        text.push_str(value.as_ref());
    }
    if text.is_empty() {
        text.push_str(VALUE_INDENT);
    }
    text.push_str(VALUE_TERMINATOR);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_text() {
        let annotation = Annotation::new("rejected-urls", ["https://a.example", "https://b.example"]);
        assert_eq!(
            annotation.text(),
            "rejected-urls=\n      https://a.example\n      https://b.example\n    "
        );
    }

    #[test]
    fn test_empty_values() {
        assert_eq!(indented_values(Vec::<String>::new()), "\n      \n    ");
    }
}
