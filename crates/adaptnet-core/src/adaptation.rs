//! Adaptation functions
//!
//! There are three kinds of adaptation function. In each example the first
//! protocol is `input`, the second is `output`, and the stack top is on the
//! right:
//!
//! - **Conversion** `(x, y)`: replaces the top protocol. `--x` → `--y`
//! - **Encapsulate** `(x, y)`: pushes a new top protocol. `--x` → `--xy`
//! - **Decapsulate** `(y, x)`: removes the top protocol. `--xy` → `--x`
//!
//! Every function has a reverse which undoes it on the stack it produced.
//! Routing relies on that law: a node that receives an advertisement for
//! stack `s` runs the reverse of each of its functions over `s` to learn which
//! stack it must be handed in order to emit `s`.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::error::{StackError, StackResult};
use crate::stack::{Protocol, ProtocolStack};

/// The kind of rewrite an adaptation function performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdaptKind {
    Conversion,
    Encapsulate,
    Decapsulate,
}

impl AdaptKind {
    /// The kind of the reverse function
    pub fn reverse(self) -> Self {
        match self {
            AdaptKind::Conversion => AdaptKind::Conversion,
            AdaptKind::Encapsulate => AdaptKind::Decapsulate,
            AdaptKind::Decapsulate => AdaptKind::Encapsulate,
        }
    }

    /// Short tag used in logs
    pub fn short_name(&self) -> &'static str {
        match self {
            AdaptKind::Conversion => "CV",
            AdaptKind::Encapsulate => "EC",
            AdaptKind::Decapsulate => "DC",
        }
    }
}

impl Display for AdaptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// An immutable rewrite rule over the top of a protocol stack
///
/// Two functions are equal when input, output and kind all match, which makes
/// the type usable as a map key (see [`Link`](crate::Link)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AdaptationFunction {
    /// Protocol expected on top of the stack
    pub input: Protocol,
    /// Protocol produced (Conversion, Encapsulate) or exposed (Decapsulate)
    pub output: Protocol,
    pub kind: AdaptKind,
}

impl AdaptationFunction {
    pub fn new(input: Protocol, output: Protocol, kind: AdaptKind) -> Self {
        Self {
            input,
            output,
            kind,
        }
    }

    /// `input` → `output` on the top of the stack
    pub fn conversion(input: u8, output: u8) -> Self {
        Self::new(Protocol(input), Protocol(output), AdaptKind::Conversion)
    }

    /// Push `output` over `input`
    pub fn encapsulation(input: u8, output: u8) -> Self {
        Self::new(Protocol(input), Protocol(output), AdaptKind::Encapsulate)
    }

    /// Pop `input`, exposing `output`
    pub fn decapsulation(input: u8, output: u8) -> Self {
        Self::new(Protocol(input), Protocol(output), AdaptKind::Decapsulate)
    }

    /// Every function over the given protocols
    ///
    /// For each protocol `p` the three kinds `p → p`, and for each unordered
    /// pair `{p, q}` the three kinds in both directions, giving
    /// `3n + 3n(n - 1)` functions for `n` protocols.
    pub fn catalogue(protocols: &[Protocol]) -> Vec<Self> {
        const KINDS: [AdaptKind; 3] = [
            AdaptKind::Conversion,
            AdaptKind::Encapsulate,
            AdaptKind::Decapsulate,
        ];
        let mut functions = Vec::with_capacity(3 * protocols.len() * protocols.len());
        for (i, &p) in protocols.iter().enumerate() {
            functions.extend(KINDS.iter().map(|&kind| Self::new(p, p, kind)));
            for &q in &protocols[i + 1..] {
                functions.extend(KINDS.iter().map(|&kind| Self::new(p, q, kind)));
                functions.extend(KINDS.iter().map(|&kind| Self::new(q, p, kind)));
            }
        }
        functions
    }

    /// Whether this function may be applied to `stack`
    pub fn valid(&self, stack: &ProtocolStack) -> bool {
        match self.kind {
            AdaptKind::Conversion => stack.top() == Some(self.input),
            AdaptKind::Encapsulate => !stack.is_full() && stack.top() == Some(self.input),
            AdaptKind::Decapsulate => {
                stack.peek(0) == Some(self.input) && stack.peek(1) == Some(self.output)
            }
        }
    }

    /// Rewrite `stack` in place
    ///
    /// Fails with [`StackError::NotApplicable`] and leaves the stack untouched
    /// when [`valid`](Self::valid) is false.
    pub fn apply(&self, stack: &mut ProtocolStack) -> StackResult<()> {
        if !self.valid(stack) {
            return Err(StackError::NotApplicable {
                function: self.to_string(),
                stack: stack.to_string(),
            });
        }
        match self.kind {
            AdaptKind::Conversion => {
                stack.pop();
                stack.push(self.output)
            }
            AdaptKind::Encapsulate => stack.push(self.output),
            AdaptKind::Decapsulate => stack.pop().map(|_| ()).ok_or(StackError::Underflow),
        }
    }

    /// A rewritten copy of `stack`, or `None` if the function is not valid on it
    pub fn applied(&self, stack: &ProtocolStack) -> Option<ProtocolStack> {
        let mut result = stack.clone();
        self.apply(&mut result).ok().map(|_| result)
    }

    /// The function undoing this one
    ///
    /// If `f.valid(s)`, applying `f` then `f.reverse()` restores `s`.
    pub fn reverse(&self) -> Self {
        Self::new(self.output, self.input, self.kind.reverse())
    }

    /// Smallest stack capacity a node needs to own this function
    ///
    /// Decapsulate must see two layers. Encapsulate still accepts `[input]`
    /// on a single slot even though it can never push there.
    pub fn required_capacity(&self) -> usize {
        match self.kind {
            AdaptKind::Conversion | AdaptKind::Encapsulate => 1,
            AdaptKind::Decapsulate => 2,
        }
    }

    /// Whether a node with stacks of `max_stack` slots keeps this function
    pub fn is_feasible(&self, max_stack: usize) -> bool {
        self.required_capacity() <= max_stack
    }

    /// Minimal stack this function accepts
    ///
    /// `[input]` for Conversion and Encapsulate, `[output, input]` for
    /// Decapsulate. `None` when the function is infeasible at `max_stack`.
    pub fn in_stack(&self, max_stack: usize) -> Option<ProtocolStack> {
        if !self.is_feasible(max_stack) {
            return None;
        }
        let protocols = match self.kind {
            AdaptKind::Decapsulate => vec![self.output, self.input],
            _ => vec![self.input],
        };
        ProtocolStack::from_protocols(max_stack, protocols).ok()
    }

    /// Minimal stack produced by this function
    ///
    /// `[output]` for Conversion and Decapsulate, `[input, output]` for
    /// Encapsulate. `None` when the result does not fit in `max_stack`.
    pub fn out_stack(&self, max_stack: usize) -> Option<ProtocolStack> {
        if !self.is_feasible(max_stack) {
            return None;
        }
        let protocols = match self.kind {
            AdaptKind::Encapsulate => vec![self.input, self.output],
            _ => vec![self.output],
        };
        ProtocolStack::from_protocols(max_stack, protocols).ok()
    }
}

impl Display for AdaptationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f('")?;
        if self.kind == AdaptKind::Decapsulate {
            write!(f, "{}", self.output)?;
        }
        write!(f, "{}' → '", self.input)?;
        if self.kind == AdaptKind::Encapsulate {
            write!(f, "{}", self.input)?;
        }
        write!(f, "{}')", self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn stack(tags: &str) -> ProtocolStack {
        ProtocolStack::from_tags(4, tags).unwrap()
    }

    fn sample_functions() -> Vec<AdaptationFunction> {
        AdaptationFunction::catalogue(&[Protocol(b'x'), Protocol(b'y')])
    }

    #[test]
    fn test_validity_depends_on_top() {
        let conv_x = AdaptationFunction::conversion(b'x', b'x');
        let decap_y = AdaptationFunction::decapsulation(b'y', b'x');

        assert!(conv_x.valid(&stack("x")));
        assert!(!conv_x.valid(&stack("y")));
        assert!(!conv_x.valid(&stack("")));

        // top is x, not y
        assert!(!decap_y.valid(&stack("yx")));
        assert!(decap_y.valid(&stack("xy")));
        assert!(!decap_y.valid(&stack("y")));
    }

    #[test]
    fn test_encapsulation_needs_room() {
        let encap = AdaptationFunction::encapsulation(b'x', b'y');
        let full = ProtocolStack::from_tags(2, "yx").unwrap();
        let roomy = ProtocolStack::from_tags(3, "yx").unwrap();

        assert!(!encap.valid(&full));
        assert!(encap.valid(&roomy));
    }

    #[test]
    fn test_apply() {
        let conv = AdaptationFunction::conversion(b'x', b'y');
        let encap = AdaptationFunction::encapsulation(b'x', b'y');
        let decap = AdaptationFunction::decapsulation(b'y', b'x');

        assert_eq!(conv.applied(&stack("yx")), Some(stack("yy")));
        assert_eq!(encap.applied(&stack("yx")), Some(stack("yxy")));
        assert_eq!(decap.applied(&stack("xy")), Some(stack("x")));
    }

    #[test]
    fn test_apply_invalid_leaves_stack_untouched() {
        let conv = AdaptationFunction::conversion(b'x', b'y');
        let mut s = stack("y");

        let err = conv.apply(&mut s).unwrap_err();
        assert!(matches!(err, StackError::NotApplicable { .. }));
        assert_eq!(s, stack("y"));
        assert_eq!(conv.applied(&s), None);
    }

    #[test]
    fn test_reverse_kinds() {
        let encap = AdaptationFunction::encapsulation(b'x', b'y');
        let rev = encap.reverse();
        assert_eq!(rev, AdaptationFunction::decapsulation(b'y', b'x'));
        assert_eq!(rev.reverse(), encap);

        let conv = AdaptationFunction::conversion(b'x', b'y');
        assert_eq!(conv.reverse(), AdaptationFunction::conversion(b'y', b'x'));
    }

    #[test]
    fn test_round_trip_law() {
        let stacks = ["x", "y", "xy", "yx", "xx", "xyx", "yyy", "xyxy"];
        for f in sample_functions() {
            for tags in stacks {
                let original = stack(tags);
                if !f.valid(&original) {
                    continue;
                }
                let forward = f.applied(&original).unwrap();
                let back = f.reverse().applied(&forward);
                assert_eq!(back, Some(original.clone()), "{} on {}", f, original);
            }
        }
    }

    #[test]
    fn test_minimality_law() {
        for f in sample_functions() {
            for max_stack in f.required_capacity()..6 {
                let input = f.in_stack(max_stack).unwrap();
                match f.out_stack(max_stack) {
                    Some(output) => {
                        assert!(f.valid(&input), "{} on {}", f, input);
                        assert_eq!(f.applied(&input), Some(output));
                    }
                    // only an encapsulation on a single slot
                    None => {
                        assert_eq!((f.kind, max_stack), (AdaptKind::Encapsulate, 1));
                        assert!(!f.valid(&input));
                    }
                }
            }
        }
    }

    #[test]
    fn test_in_and_out_stacks() {
        let decap = AdaptationFunction::decapsulation(b'y', b'x');
        assert_eq!(decap.in_stack(4), Some(stack("xy")));
        assert_eq!(decap.out_stack(4), Some(stack("x")));

        let encap = AdaptationFunction::encapsulation(b'x', b'y');
        assert_eq!(encap.in_stack(4), Some(stack("x")));
        assert_eq!(encap.out_stack(4), Some(stack("xy")));
    }

    #[test]
    fn test_single_slot_feasibility() {
        let decap = AdaptationFunction::decapsulation(b'y', b'x');
        let encap = AdaptationFunction::encapsulation(b'x', b'y');
        let conv = AdaptationFunction::conversion(b'x', b'y');

        assert!(!decap.is_feasible(1));
        assert_eq!(decap.in_stack(1), None);
        assert_eq!(decap.out_stack(1), None);
        assert!(conv.is_feasible(1));
        assert_eq!(conv.in_stack(1).map(|s| s.to_string()), Some("<x>".to_string()));

        // encapsulation keeps its input but cannot produce anything
        assert!(encap.is_feasible(1));
        assert_eq!(encap.in_stack(1), Some(ProtocolStack::from_tags(1, "x").unwrap()));
        assert_eq!(encap.out_stack(1), None);
    }

    #[test]
    fn test_catalogue_size() {
        let protocols: Vec<Protocol> = b"abc".iter().map(|&t| Protocol(t)).collect();
        let n = protocols.len();
        let functions = AdaptationFunction::catalogue(&protocols);
        assert_eq!(functions.len(), 3 * n + 3 * n * (n - 1));
    }

    #[test]
    fn test_equal_functions_hash_equal() {
        let mut costs = HashMap::new();
        costs.insert(AdaptationFunction::conversion(b'x', b'y'), 3);
        assert_eq!(costs.get(&AdaptationFunction::conversion(b'x', b'y')), Some(&3));
        assert_eq!(costs.get(&AdaptationFunction::encapsulation(b'x', b'y')), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            AdaptationFunction::encapsulation(b'x', b'y').to_string(),
            "f('x' → 'xy')"
        );
        assert_eq!(
            AdaptationFunction::decapsulation(b'y', b'x').to_string(),
            "f('xy' → 'x')"
        );
        assert_eq!(
            AdaptationFunction::conversion(b'x', b'y').to_string(),
            "f('x' → 'y')"
        );
    }
}
