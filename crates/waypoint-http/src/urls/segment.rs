//! Route path validation and segment parsing.
//!
//! A route path is split on `/` into segments of three kinds:
//!
//! - literal: any text not starting with `:` and not equal to `*`
//! - parameter: `:name` or `:name(<regex>)`; the regex is used as written
//! - wildcard: exactly `*`

use regex::Regex;
use waypoint_core::{WaypointError, WaypointResult};

/// A parsed route segment.
#[derive(Debug, Clone)]
pub enum Segment<'a> {
    /// Fixed text that must match the request segment exactly.
    Literal(&'a str),
    /// A named capture with an optional regex constraint.
    Param {
        /// The parameter name without the leading `:`.
        name: &'a str,
        /// The compiled constraint, if the segment carried one.
        regex: Option<Regex>,
    },
    /// `*`.
    Wildcard,
}

impl Segment<'_> {
    /// Returns the label stored on the tree node and used in its full path.
    ///
    /// Parameters keep their constraint, so `:id([0-9]+)` stays `:id([0-9]+)`.
    pub fn label(&self) -> String {
        match self {
            Self::Literal(text) => (*text).to_string(),
            Self::Param { name, regex: None } => format!(":{name}"),
            Self::Param {
                name,
                regex: Some(re),
            } => format!(":{name}({})", re.as_str()),
            Self::Wildcard => "*".to_string(),
        }
    }
}

/// Checks that `path` is a well-formed route path.
///
/// # Errors
///
/// Returns [`WaypointError::InvalidPath`] if the path is empty, does not start
/// with `/`, ends with `/` (other than the root path itself), or contains an
/// empty segment.
pub fn validate_path(path: &str) -> WaypointResult<()> {
    let reason = if path.is_empty() {
        "path cannot be empty"
    } else if !path.starts_with('/') {
        "path must start with '/'"
    } else if path != "/" && path.ends_with('/') {
        "path must not end with '/'"
    } else if path.contains("//") {
        "path must not contain empty segments"
    } else {
        return Ok(());
    };
    Err(WaypointError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    })
}

/// Parses a single segment of the route `path`.
///
/// # Errors
///
/// Returns [`WaypointError::InvalidPath`] for a parameter without a name or with
/// an opening `(` that is not closed at the end of the segment, and
/// [`WaypointError::RegexCompile`] if the constraint does not compile.
pub fn parse_segment<'a>(segment: &'a str, path: &str) -> WaypointResult<Segment<'a>> {
    if segment == "*" {
        return Ok(Segment::Wildcard);
    }
    let Some(param) = segment.strip_prefix(':') else {
        return Ok(Segment::Literal(segment));
    };

    let (name, regex) = match param.find('(') {
        None => (param, None),
        Some(open) => {
            let Some(source) = param[open + 1..].strip_suffix(')') else {
                return Err(WaypointError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("unclosed regex constraint in segment '{segment}'"),
                });
            };
            let regex = Regex::new(source).map_err(|source| WaypointError::RegexCompile {
                segment: segment.to_string(),
                source,
            })?;
            (&param[..open], Some(regex))
        }
    };

    if name.is_empty() {
        return Err(WaypointError::InvalidPath {
            path: path.to_string(),
            reason: format!("parameter segment '{segment}' has no name"),
        });
    }
    Ok(Segment::Param { name, regex })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path_accepts() {
        for path in ["/", "/a", "/a/b/c", "/user/:id", "/static/*", "/x/:id(^[0-9]+$)"] {
            assert!(validate_path(path).is_ok(), "{path}");
        }
    }

    #[test]
    fn test_validate_path_rejects() {
        for path in ["", "a/b", "/a/", "/a//b", "//"] {
            let err = validate_path(path).unwrap_err();
            assert!(
                matches!(err, WaypointError::InvalidPath { .. }),
                "{path}: {err}"
            );
        }
    }

    #[test]
    fn test_parse_literal_and_wildcard() {
        assert!(matches!(
            parse_segment("users", "/users").unwrap(),
            Segment::Literal("users")
        ));
        assert!(matches!(parse_segment("*", "/*").unwrap(), Segment::Wildcard));
        // Only a bare `*` is a wildcard.
        assert!(matches!(
            parse_segment("*.js", "/*.js").unwrap(),
            Segment::Literal("*.js")
        ));
    }

    #[test]
    fn test_parse_param() {
        let seg = parse_segment(":id", "/user/:id").unwrap();
        assert!(matches!(seg, Segment::Param { name: "id", regex: None }));
        assert_eq!(seg.label(), ":id");
    }

    #[test]
    fn test_parse_param_with_regex() {
        let seg = parse_segment(":id(^[0-9]+$)", "/user/:id(^[0-9]+$)").unwrap();
        match &seg {
            Segment::Param {
                name,
                regex: Some(re),
            } => {
                assert_eq!(*name, "id");
                assert!(re.is_match("123"));
                assert!(!re.is_match("abc"));
            }
            other => panic!("unexpected segment {other:?}"),
        }
        assert_eq!(seg.label(), ":id(^[0-9]+$)");
    }

    #[test]
    fn test_regex_is_not_anchored_implicitly() {
        let seg = parse_segment(":code([0-9]+)", "/c/:code([0-9]+)").unwrap();
        let Segment::Param { regex: Some(re), .. } = seg else {
            panic!("expected a constrained parameter");
        };
        assert!(re.is_match("ab12"));
    }

    #[test]
    fn test_parse_param_errors() {
        assert!(matches!(
            parse_segment(":id([0-9]+", "/u/:id([0-9]+"),
            Err(WaypointError::InvalidPath { .. })
        ));
        assert!(matches!(
            parse_segment(":id([0-9+)", "/u/:id([0-9+)"),
            Err(WaypointError::RegexCompile { .. })
        ));
        assert!(matches!(
            parse_segment(":", "/u/:"),
            Err(WaypointError::InvalidPath { .. })
        ));
        assert!(matches!(
            parse_segment(":([0-9]+)", "/u/:([0-9]+)"),
            Err(WaypointError::InvalidPath { .. })
        ));
    }
}
