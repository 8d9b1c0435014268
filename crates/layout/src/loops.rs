//! Loop records: the topological input a module is built from.

use crate::graph::NodeKind;
use std::fmt;
use std::str::FromStr;
use tqec_pack_core::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Defect type of a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LoopType {
    /// Primal defect loop.
    Primal,
    /// Dual defect loop.
    Dual,
}

impl LoopType {
    /// Node tag used for this loop's frame.
    pub fn node_kind(self) -> NodeKind {
        match self {
            LoopType::Primal => NodeKind::Primal,
            LoopType::Dual => NodeKind::Dual,
        }
    }

    /// The other loop type.
    pub fn opposite(self) -> Self {
        match self {
            LoopType::Primal => LoopType::Dual,
            LoopType::Dual => LoopType::Primal,
        }
    }
}

impl FromStr for LoopType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primal" => Ok(LoopType::Primal),
            "dual" => Ok(LoopType::Dual),
            other => Err(Error::MalformedInput(format!(
                "unknown loop type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LoopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopType::Primal => f.write_str("primal"),
            LoopType::Dual => f.write_str("dual"),
        }
    }
}

/// A closed defect loop with the loops it crosses and its injectors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Loop {
    id: i64,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    loop_type: LoopType,
    cross: Vec<i64>,
    pins: u32,
    caps: u32,
}

impl Loop {
    /// Creates a loop with no crossings and no injectors.
    pub fn new(id: i64, loop_type: LoopType) -> Self {
        Self {
            id,
            loop_type,
            cross: Vec::new(),
            pins: 0,
            caps: 0,
        }
    }

    /// Sets the ids of the crossed loops, in order.
    pub fn with_cross(mut self, cross: Vec<i64>) -> Self {
        self.cross = cross;
        self
    }

    /// Sets the pin count.
    pub fn with_pins(mut self, pins: u32) -> Self {
        self.pins = pins;
        self
    }

    /// Sets the cap count.
    pub fn with_caps(mut self, caps: u32) -> Self {
        self.caps = caps;
        self
    }

    /// Loop id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Primal or dual.
    pub fn loop_type(&self) -> LoopType {
        self.loop_type
    }

    /// Ids of the crossed loops.
    pub fn cross(&self) -> &[i64] {
        &self.cross
    }

    /// Number of pin injectors.
    pub fn pins(&self) -> u32 {
        self.pins
    }

    /// Number of cap injectors.
    pub fn caps(&self) -> u32 {
        self.caps
    }

    /// Total injector count.
    pub fn injectors(&self) -> u32 {
        self.pins + self.caps
    }
}

impl fmt::Display for Loop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- loop {} ---", self.id)?;
        writeln!(f, "type: {}", self.loop_type)?;
        let cross: Vec<String> = self.cross.iter().map(|c| c.to_string()).collect();
        writeln!(f, "cross: [{}]", cross.join(", "))?;
        writeln!(f, "pins: {}", self.pins)?;
        write!(f, "caps: {}", self.caps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_type_parse() {
        assert_eq!("primal".parse::<LoopType>().unwrap(), LoopType::Primal);
        assert_eq!("dual".parse::<LoopType>().unwrap(), LoopType::Dual);
        assert!(matches!(
            "Primal".parse::<LoopType>(),
            Err(Error::MalformedInput(_))
        ));
        assert_eq!(LoopType::Dual.node_kind(), NodeKind::Dual);
    }

    #[test]
    fn test_loop_builder() {
        let l = Loop::new(4, LoopType::Dual)
            .with_cross(vec![1, 2])
            .with_pins(1)
            .with_caps(2);
        assert_eq!(l.cross(), &[1, 2]);
        assert_eq!(l.injectors(), 3);
        assert!(l.to_string().starts_with("--- loop 4 ---"));
    }
}
