use super::artifact::{compare_versions, Properties};
use crate::shared::Result;
use std::cmp::Ordering;
use std::fmt;

/// LDAP-style filter attached to a requirement, e.g. `(&(osgi.os=linux)(osgi.arch=x86_64))`.
///
/// Filters are evaluated against a context made of string properties.
/// Attribute names match case-insensitively, values support `*` wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementFilter {
    source: String,
    node: FilterNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterNode {
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Not(Box<FilterNode>),
    Present(String),
    Compare {
        attribute: String,
        operator: Operator,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equal,
    Approx,
    GreaterOrEqual,
    LessOrEqual,
}

impl RequirementFilter {
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        let mut parser = Parser {
            chars: trimmed.chars().collect(),
            position: 0,
        };
        let node = parser.filter()?;
        parser.skip_whitespace();
        if parser.position != parser.chars.len() {
            anyhow::bail!("Unexpected trailing characters in filter: {}", source);
        }
        Ok(Self {
            source: trimmed.to_string(),
            node,
        })
    }

    pub fn matches(&self, context: &Properties) -> bool {
        evaluate(&self.node, context)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for RequirementFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn lookup<'a>(context: &'a Properties, attribute: &str) -> Option<&'a str> {
    context
        .get(attribute)
        .or_else(|| {
            context
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(attribute))
                .map(|(_, value)| value)
        })
        .map(String::as_str)
}

fn evaluate(node: &FilterNode, context: &Properties) -> bool {
    match node {
        FilterNode::And(children) => children.iter().all(|child| evaluate(child, context)),
        FilterNode::Or(children) => children.iter().any(|child| evaluate(child, context)),
        FilterNode::Not(child) => !evaluate(child, context),
        FilterNode::Present(attribute) => lookup(context, attribute).is_some(),
        FilterNode::Compare {
            attribute,
            operator,
            value,
        } => {
            let Some(actual) = lookup(context, attribute) else {
                return false;
            };
            match operator {
                Operator::Equal => wildcard_match(value, actual),
                Operator::Approx => wildcard_match(
                    &value.to_lowercase().replace(char::is_whitespace, ""),
                    &actual.to_lowercase().replace(char::is_whitespace, ""),
                ),
                Operator::GreaterOrEqual => compare_values(actual, value) != Ordering::Less,
                Operator::LessOrEqual => compare_values(actual, value) != Ordering::Greater,
            }
        }
    }
}

fn compare_values(actual: &str, expected: &str) -> Ordering {
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(e)) => a.partial_cmp(&e).unwrap_or(Ordering::Equal),
        _ => compare_versions(actual, expected),
    }
}

fn wildcard_match(pattern: &str, value: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = value;
    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if index == 0 {
            match rest.strip_prefix(part) {
                Some(remaining) => rest = remaining,
                None => return false,
            }
        } else if index == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(offset) => rest = &rest[offset + part.len()..],
                None => return false,
            }
        }
    }
    true
}

struct Parser {
    chars: Vec<char>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.position += 1;
                Ok(())
            }
            other => anyhow::bail!(
                "Expected '{}' at offset {} but found {:?}",
                expected,
                self.position,
                other
            ),
        }
    }

    fn filter(&mut self) -> Result<FilterNode> {
        self.expect('(')?;
        self.skip_whitespace();
        let node = match self.peek() {
            Some('&') => {
                self.position += 1;
                FilterNode::And(self.filter_list()?)
            }
            Some('|') => {
                self.position += 1;
                FilterNode::Or(self.filter_list()?)
            }
            Some('!') => {
                self.position += 1;
                FilterNode::Not(Box::new(self.filter()?))
            }
            _ => self.item()?,
        };
        self.expect(')')?;
        Ok(node)
    }

    fn filter_list(&mut self) -> Result<Vec<FilterNode>> {
        let mut children = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() != Some('(') {
                break;
            }
            children.push(self.filter()?);
        }
        if children.is_empty() {
            anyhow::bail!("Empty filter list at offset {}", self.position);
        }
        Ok(children)
    }

    fn item(&mut self) -> Result<FilterNode> {
        let mut attribute = String::new();
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '~' | '>' | '<' | '(' | ')') {
                break;
            }
            attribute.push(c);
            self.position += 1;
        }
        let attribute = attribute.trim().to_string();
        if attribute.is_empty() {
            anyhow::bail!("Missing attribute name at offset {}", self.position);
        }

        let operator = match self.peek() {
            Some('=') => {
                self.position += 1;
                Operator::Equal
            }
            Some(c @ ('~' | '>' | '<')) => {
                self.position += 1;
                if self.peek() != Some('=') {
                    anyhow::bail!("Invalid operator at offset {}", self.position);
                }
                self.position += 1;
                match c {
                    '~' => Operator::Approx,
                    '>' => Operator::GreaterOrEqual,
                    _ => Operator::LessOrEqual,
                }
            }
            other => anyhow::bail!("Expected operator but found {:?}", other),
        };

        let mut value = String::new();
        while let Some(c) = self.peek() {
            match c {
                ')' => break,
                '\\' => {
                    self.position += 1;
                    if let Some(escaped) = self.peek() {
                        value.push(escaped);
                        self.position += 1;
                    }
                }
                _ => {
                    value.push(c);
                    self.position += 1;
                }
            }
        }

        if operator == Operator::Equal && value == "*" {
            return Ok(FilterNode::Present(attribute));
        }
        Ok(FilterNode::Compare {
            attribute,
            operator,
            value,
        })
    }
}
