// SPDX-License-Identifier: MIT

//! Named-parameter rewriting and binding.
//!
//! SQL templates use named placeholders:
//!
//! ```text
//! SELECT * FROM person WHERE name=:name OR email=:email
//! ```
//!
//! [`rewrite`] turns that into a positional template (`?` placeholders) plus
//! a [`ParamMap`] recording which 1-based positions each name occupies, so
//! rearranging a statement or adding a parameter never involves renumbering
//! indices. A name used several times accumulates every position it was
//! assigned, in encounter order.
//!
//! The scan tracks single- and double-quoted literals: inside a quote,
//! characters are copied verbatim and only the matching closing quote exits
//! the state. There is no escape handling beyond the closing quote itself,
//! and an unterminated quote simply runs to the end of the template. A `:`
//! preceded by another `:` never opens a parameter, which keeps PostgreSQL
//! cast syntax (`value::integer`) intact.
//!
//! Binding comes in two flavours, both applied through [`ArgBuffer`]:
//! [`ArgBuffer::set`] fails on an unknown name (a caller error), while
//! [`ArgBuffer::set_loose`] silently skips it — the variant used when
//! binding a full entity against templates that only use some of its
//! columns (a DELETE has no enum columns, for instance).

use std::collections::HashMap;

use crate::{error::MapperError, value::Value};

/// The positional placeholder a named parameter is rewritten to.
const PLACEHOLDER: char = '?';

/// Mapping from parameter name to the 1-based positions it occupies in one
/// rewritten template. Built once per template, immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct ParamMap {
    positions: HashMap<String, Vec<usize>>,
    count:     usize
}

impl ParamMap {
    /// Total number of positional slots in the template.
    pub fn slot_count(&self) -> usize {
        self.count
    }

    /// True when the template contained no named parameters.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether `name` occurs in the template.
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Positions for `name`, failing when the parameter does not exist.
    pub fn positions(&self, name: &str) -> Result<&[usize], MapperError> {
        self.positions
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| MapperError::UnknownParameter {
                name: name.to_string()
            })
    }

    /// Positions for `name`, `None` when absent.
    pub fn get(&self, name: &str) -> Option<&[usize]> {
        self.positions.get(name).map(Vec::as_slice)
    }
}

/// Rewrite a template with named parameters into a positional template and
/// its [`ParamMap`].
///
/// Positions are assigned left to right, incrementing per occurrence rather
/// than per distinct name. A template without named parameters comes back
/// unchanged with an empty map.
pub fn rewrite(template: &str) -> (String, ParamMap) {
    let chars: Vec<char> = template.chars().collect();
    let mut rewritten = String::with_capacity(template.len());
    let mut positions: HashMap<String, Vec<usize>> = HashMap::new();

    let mut in_single = false;
    let mut in_double = false;
    let mut next_position = 1usize;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_single {
            if c == '\'' {
                in_single = false;
            }
        } else if in_double {
            if c == '"' {
                in_double = false;
            }
        } else if c == '\'' {
            in_single = true;
        } else if c == '"' {
            in_double = true;
        } else if is_parameter_start(&chars, i) {
            let mut end = i + 1;
            while end < chars.len() && is_ident_part(chars[end]) {
                end += 1;
            }
            let name: String = chars[i + 1..end].iter().collect();
            positions.entry(name).or_default().push(next_position);
            next_position += 1;

            rewritten.push(PLACEHOLDER);
            i = end;
            continue;
        }
        rewritten.push(c);
        i += 1;
    }

    let map = ParamMap {
        positions,
        count: next_position - 1
    };
    (rewritten, map)
}

/// A `:` opens a parameter when an identifier-start character follows and
/// the previous character is not itself a `:` (the double-colon guard for
/// enum casts).
fn is_parameter_start(chars: &[char], i: usize) -> bool {
    chars[i] == ':'
        && chars.get(i + 1).copied().is_some_and(is_ident_start)
        && (i == 0 || chars[i - 1] != ':')
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Positional argument slots for one execution of a rewritten template.
///
/// Slots start out as [`Value::Null`]; binding a name writes the value into
/// every position that name occupies.
#[derive(Debug)]
pub struct ArgBuffer {
    slots: Vec<Value>
}

impl ArgBuffer {
    /// Allocate one slot per position of `map`.
    pub fn new(map: &ParamMap) -> Self {
        Self {
            slots: vec![Value::Null; map.slot_count()]
        }
    }

    /// Exact bind: fails with [`MapperError::UnknownParameter`] when `name`
    /// is not in the map.
    pub fn set(&mut self, map: &ParamMap, name: &str, value: Value) -> Result<(), MapperError> {
        for &position in map.positions(name)? {
            self.slots[position - 1] = value.clone();
        }
        Ok(())
    }

    /// Best-effort bind: a no-op when `name` is not in the map.
    pub fn set_loose(&mut self, map: &ParamMap, name: &str, value: Value) {
        if let Some(indexes) = map.get(name) {
            for &position in indexes {
                self.slots[position - 1] = value.clone();
            }
        }
    }

    /// The bound slots, in positional order.
    pub fn as_slice(&self) -> &[Value] {
        &self.slots
    }
}
