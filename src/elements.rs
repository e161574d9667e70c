//! Element models: resistors, voltage sources, current sources.
//!
//! Elements are immutable value data owned by the branch they sit on. A
//! branch may carry several elements in series; their order is irrelevant.

use crate::circuit::Direction;

/// A resistor element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resistor {
    /// Resistance in ohms (non-negative)
    pub resistance: f64,
}

/// An ideal voltage source element.
///
/// `polarity` gives the node pair the voltage value is referenced to. It is
/// mandatory for any source placed on a branch; only the topology-free
/// element-list form may omit it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageSource {
    /// Source voltage in volts (signed)
    pub voltage: f64,
    /// Reference polarity
    pub polarity: Option<Direction>,
}

/// An ideal current source element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSource {
    /// Source current in amperes (signed)
    pub current: f64,
    /// Reference polarity
    pub polarity: Option<Direction>,
}

/// A circuit element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element {
    Resistor(Resistor),
    VoltageSource(VoltageSource),
    CurrentSource(CurrentSource),
}

impl Element {
    /// Create a resistor element.
    pub fn resistor(resistance: f64) -> Self {
        Element::Resistor(Resistor { resistance })
    }

    /// Create a voltage source element.
    pub fn voltage_source(voltage: f64, polarity: Option<Direction>) -> Self {
        Element::VoltageSource(VoltageSource { voltage, polarity })
    }

    /// Create a current source element.
    pub fn current_source(current: f64, polarity: Option<Direction>) -> Self {
        Element::CurrentSource(CurrentSource { current, polarity })
    }

    /// Whether this element is a resistor.
    ///
    /// A branch with no resistor at all is "specific": its conductance is
    /// undefined and it needs constraint-equation handling. The check is by
    /// element kind, not value - a zero-ohm resistor still counts.
    pub fn is_resistor(&self) -> bool {
        matches!(self, Element::Resistor(_))
    }

    /// Human-readable element kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Resistor(_) => "resistor",
            Element::VoltageSource(_) => "voltage source",
            Element::CurrentSource(_) => "current source",
        }
    }

    /// Reference polarity, if this element kind carries one.
    pub fn polarity(&self) -> Option<Direction> {
        match self {
            Element::Resistor(_) => None,
            Element::VoltageSource(v) => v.polarity,
            Element::CurrentSource(i) => i.polarity,
        }
    }
}

/// Per-branch aggregates of the elements placed on it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementSums {
    /// Sum of all resistor values
    pub resistance: f64,
    /// Signed sum of voltage source values
    pub voltage: f64,
    /// Signed sum of current source values
    pub current: f64,
}

/// Fold the elements of a branch into resistance/voltage/current sums.
///
/// A source contributes its value positively when its polarity start matches
/// the branch direction start, negatively otherwise.
pub fn sum_contributions(elements: &[Element], direction: Direction) -> ElementSums {
    let signed = |value: f64, polarity: Option<Direction>| match polarity {
        Some(p) if p.start == direction.start => value,
        Some(_) => -value,
        None => value,
    };

    elements
        .iter()
        .fold(ElementSums::default(), |mut sums, element| {
            match element {
                Element::Resistor(r) => sums.resistance += r.resistance,
                Element::VoltageSource(v) => sums.voltage += signed(v.voltage, v.polarity),
                Element::CurrentSource(i) => sums.current += signed(i.current, i.polarity),
            }
            sums
        })
}

/// Sum of raw resistor values over a flat element list.
pub fn total_resistance<'a>(elements: impl IntoIterator<Item = &'a Element>) -> f64 {
    elements
        .into_iter()
        .filter_map(|e| match e {
            Element::Resistor(r) => Some(r.resistance),
            _ => None,
        })
        .sum()
}

/// Sum of raw voltage source values over a flat element list.
pub fn total_voltage<'a>(elements: impl IntoIterator<Item = &'a Element>) -> f64 {
    elements
        .into_iter()
        .filter_map(|e| match e {
            Element::VoltageSource(v) => Some(v.voltage),
            _ => None,
        })
        .sum()
}
