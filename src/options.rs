//! Formatting policy for regenerated output.
//!
//! This module provides the types that decide which notation the writer uses
//! for values it has to regenerate:
//!
//! - [`FormatPolicy`]: the policy value handed to every notation decision
//! - [`PrintMode`]: automatic, forced collapsed or forced expanded notation
//!
//! Lines that come from the source text and were not touched are never
//! reformatted, whatever the policy says.
//!
//! ## Examples
//!
//! ```rust
//! use bearml::{element_to_string, element, FormatPolicy, PrintMode};
//!
//! let list = element!(["a", "b", "c"]);
//!
//! let expanded = element_to_string(&list, &FormatPolicy::new());
//! assert_eq!(expanded, "\n  - a\n  - b\n  - c");
//!
//! let policy = FormatPolicy::new().with_max_elements(2);
//! assert_eq!(element_to_string(&list, &policy), "\n  [\"a\", \"b\", \"c\"]");
//!
//! let policy = FormatPolicy::new().with_print_mode(PrintMode::Compact);
//! assert_eq!(element_to_string(&list, &policy), "\n  [\"a\", \"b\", \"c\"]");
//! ```

/// How the writer chooses between collapsed and expanded notation.
///
/// Values that can only be written one way ignore the mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PrintMode {
    /// Decide per element from its content
    #[default]
    Auto,
    /// Prefer collapsed notation
    Compact,
    /// Prefer expanded notation
    Expand,
}

/// Policy for choosing notations when lines are regenerated.
///
/// # Examples
///
/// ```rust
/// use bearml::{FormatPolicy, PrintMode};
///
/// let policy = FormatPolicy::default();
/// assert_eq!(policy.print_mode, PrintMode::Auto);
/// assert_eq!(policy.max_elements, 12);
///
/// let policy = FormatPolicy::compact();
/// assert_eq!(policy.print_mode, PrintMode::Compact);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatPolicy {
    pub print_mode: PrintMode,
    /// In [`PrintMode::Auto`], lists and dictionaries with more elements than
    /// this are collapsed.
    pub max_elements: usize,
}

pub const DEFAULT_MAX_ELEMENTS: usize = 12;

impl Default for FormatPolicy {
    fn default() -> Self {
        FormatPolicy {
            print_mode: PrintMode::Auto,
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }
}

impl FormatPolicy {
    /// Creates the default policy (automatic notation, 12 elements).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that prefers collapsed notation.
    #[must_use]
    pub fn compact() -> Self {
        FormatPolicy {
            print_mode: PrintMode::Compact,
            ..Default::default()
        }
    }

    /// Creates a policy that prefers expanded notation.
    #[must_use]
    pub fn expanded() -> Self {
        FormatPolicy {
            print_mode: PrintMode::Expand,
            ..Default::default()
        }
    }

    /// Sets the print mode.
    #[must_use]
    pub fn with_print_mode(mut self, print_mode: PrintMode) -> Self {
        self.print_mode = print_mode;
        self
    }

    /// Sets the element count above which automatic mode collapses.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bearml::FormatPolicy;
    ///
    /// let policy = FormatPolicy::new().with_max_elements(4);
    /// assert_eq!(policy.max_elements, 4);
    /// ```
    #[must_use]
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }
}
