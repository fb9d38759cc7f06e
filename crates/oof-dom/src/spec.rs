#![forbid(unsafe_code)]

//! Tag specs: `tag#id.class1.class2`.
//!
//! The same scanner drives element creation and selector compounds. For
//! elements an empty tag means `div`; for selectors it means "any tag".

use std::fmt;

use smallvec::SmallVec;

/// A parsed tag spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpec {
    pub tag: String,
    pub id: Option<String>,
    pub classes: SmallVec<[String; 2]>,
}

/// Raw scan result. Empty names are kept so callers can decide whether they
/// are an error.
#[derive(Debug, Default)]
pub(crate) struct SpecParts {
    pub tag: String,
    pub id: Option<String>,
    pub classes: SmallVec<[String; 2]>,
}

#[derive(Clone, Copy)]
enum Section {
    Tag,
    Id,
    Class,
}

pub(crate) fn scan(spec: &str) -> SpecParts {
    let mut parts = SpecParts::default();
    let mut section = Section::Tag;
    for ch in spec.chars() {
        match ch {
            // A second `#` starts the id over.
            '#' => {
                parts.id = Some(String::new());
                section = Section::Id;
            }
            '.' => {
                parts.classes.push(String::new());
                section = Section::Class;
            }
            _ => {
                let slot = match section {
                    Section::Tag => Some(&mut parts.tag),
                    Section::Id => parts.id.as_mut(),
                    Section::Class => parts.classes.last_mut(),
                };
                if let Some(slot) = slot {
                    slot.push(ch);
                }
            }
        }
    }
    parts
}

impl TagSpec {
    /// Default tag when a spec names none.
    pub const DEFAULT_TAG: &'static str = "div";

    /// Parse a spec. Never fails: an empty tag becomes `div`, and empty id or
    /// class names are dropped.
    ///
    /// ```
    /// use oof_dom::TagSpec;
    ///
    /// let spec = TagSpec::parse("li#first.item.done");
    /// assert_eq!(spec.tag, "li");
    /// assert_eq!(spec.id.as_deref(), Some("first"));
    /// assert_eq!(spec.classes.as_slice(), ["item", "done"]);
    ///
    /// assert_eq!(TagSpec::parse(".row").tag, "div");
    /// ```
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let SpecParts { tag, id, classes } = scan(spec);
        Self {
            tag: if tag.is_empty() {
                Self::DEFAULT_TAG.to_string()
            } else {
                tag
            },
            id: id.filter(|id| !id.is_empty()),
            classes: classes.into_iter().filter(|c| !c.is_empty()).collect(),
        }
    }
}

impl fmt::Display for TagSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)?;
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spec_is_div() {
        let spec = TagSpec::parse("");
        assert_eq!(spec.tag, "div");
        assert_eq!(spec.id, None);
        assert!(spec.classes.is_empty());
    }

    #[test]
    fn order_of_sections_is_free() {
        let spec = TagSpec::parse("p.a#x.b");
        assert_eq!(spec.tag, "p");
        assert_eq!(spec.id.as_deref(), Some("x"));
        assert_eq!(spec.classes.as_slice(), ["a", "b"]);
    }

    #[test]
    fn later_id_wins() {
        assert_eq!(TagSpec::parse("#one#two").id.as_deref(), Some("two"));
    }

    #[test]
    fn empty_names_are_dropped() {
        let spec = TagSpec::parse("span#..x.");
        assert_eq!(spec.id, None);
        assert_eq!(spec.classes.as_slice(), ["x"]);
    }

    #[test]
    fn scan_keeps_empty_names() {
        let parts = scan("#.");
        assert_eq!(parts.tag, "");
        assert_eq!(parts.id.as_deref(), Some(""));
        assert_eq!(parts.classes.as_slice(), [""]);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let spec = TagSpec::parse("ul#todo.list.compact");
        assert_eq!(spec.to_string(), "ul#todo.list.compact");
        assert_eq!(TagSpec::parse(&spec.to_string()), spec);
    }
}
