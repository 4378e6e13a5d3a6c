//! Snapshot of the types currently under construction.

use std::fmt;

use haqn_support::rendering::render_chain;

use crate::error::{InjectorError, Result};
use crate::key::TypeName;
use crate::value::{Value, ValueError};

/// The ordered stack of type names being built within one `make` call
/// tree, outermost first.
///
/// Delegates and preparation hooks receive the injector and can take a
/// snapshot with [`Injector::injection_chain`](crate::Injector::injection_chain)
/// to behave differently depending on who asked for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionChain {
    chain: Vec<TypeName>,
}

impl InjectionChain {
    pub fn new(chain: Vec<TypeName>) -> Self {
        Self { chain }
    }

    /// All entries, outermost first.
    #[inline]
    pub fn chain(&self) -> &[TypeName] {
        &self.chain
    }

    /// Looks an entry up by position.
    ///
    /// Non-negative indices count from the root (`0` is the type originally
    /// requested); negative indices count from the innermost entry (`-1` is
    /// the type being built right now). Out of range yields `None`.
    ///
    /// ```
    /// use haqn_container::InjectionChain;
    ///
    /// let chain = InjectionChain::new(vec!["Root".into(), "Dep".into(), "V".into()]);
    /// assert_eq!(chain.by_index(0).map(|t| t.as_str()), Some("Root"));
    /// assert_eq!(chain.by_index(-2).map(|t| t.as_str()), Some("Dep"));
    /// assert_eq!(chain.by_index(7), None);
    /// ```
    pub fn by_index(&self, index: isize) -> Option<&TypeName> {
        let position = if index < 0 {
            self.chain.len().checked_sub(index.unsigned_abs())?
        } else {
            index.unsigned_abs()
        };
        self.chain.get(position)
    }

    /// Like [`by_index`](Self::by_index), with the index taken from dynamic
    /// data. Integral numbers and numeric strings are accepted.
    ///
    /// # Errors
    /// [`InjectorError::InvalidArgument`] when `index` is not numeric.
    pub fn by_value(&self, index: &Value) -> Result<Option<&TypeName>> {
        let numeric = match index {
            Value::Int(i) => isize::try_from(*i).ok(),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as isize),
            Value::Str(s) => s.trim().parse::<isize>().ok(),
            _ => None,
        };

        match numeric {
            Some(i) => Ok(self.by_index(i)),
            None => Err(InjectorError::InvalidArgument {
                position: 0,
                source: ValueError {
                    expected: "numeric index".to_string(),
                    found: index.type_name(),
                },
            }),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeName> {
        self.chain.iter()
    }
}

impl fmt::Display for InjectionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_chain(&self.chain))
    }
}
