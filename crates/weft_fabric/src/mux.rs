//! Multiplexer models: configuration-bit cost and bit patterns.
//!
//! A multiplexer with `N` inputs is built from `L` levels of `k`-input
//! stages. CMOS multiplexers are driven by SRAM bits; RRAM multiplexers are
//! programmed through bit-line/word-line pairs and share `N` reserved
//! BL/WL lines with every other RRAM multiplexer of the same block.
//!
//! | structure      | `L`                    | `k`                     | CMOS bits | RRAM bits |
//! |----------------|------------------------|-------------------------|-----------|-----------|
//! | any, `N == 2`  | 1                      | 2                       | 1         | 3         |
//! | tree           | `ceil(log2 N)`         | 2                       | `L`       | `L(k+1)`  |
//! | one-level      | 1                      | `N`                     | `N`       | `N+1`     |
//! | multi-level(n) | `min(n, ceil(log2 N))` | least `k` with `k^L ≥ N` | `L·k`     | `L(k+1)`  |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weft_common::{InternalError, WeftResult};
use weft_config::{DesignKind, MuxConfig, StructureKind, TechnologyConfig};

/// Multiplexer topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MuxStructure {
    /// Binary tree of 2:1 stages with a binary-encoded select.
    Tree,
    /// One stage, one-hot select.
    OneLevel,
    /// The given number of stages, one-hot select per stage.
    MultiLevel(u32),
}

/// Configuration bits of one multiplexer, LSB first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MuxBits {
    /// SRAM bits of a CMOS multiplexer.
    Sram(Vec<bool>),
    /// Bit-line and word-line values of an RRAM multiplexer.
    BlWl {
        /// Bit lines.
        bl: Vec<bool>,
        /// Word lines.
        wl: Vec<bool>,
    },
}

impl MuxBits {
    /// Number of configuration bits (BL/WL pairs count once).
    pub fn len(&self) -> usize {
        match self {
            MuxBits::Sram(bits) => bits.len(),
            MuxBits::BlWl { bl, .. } => bl.len(),
        }
    }

    /// Returns `true` if there are no bits.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Formats bits LSB first as `0`/`1` characters.
pub fn bit_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

/// A multiplexer circuit model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MuxModel {
    /// Model name.
    pub name: String,
    /// Prefix of the generated primitive names.
    pub prefix: String,
    /// Device technology.
    pub design: DesignKind,
    /// Topology.
    pub structure: MuxStructure,
}

impl MuxModel {
    /// Creates a model.
    pub fn new(name: impl Into<String>, design: DesignKind, structure: MuxStructure) -> Self {
        let name = name.into();
        Self {
            prefix: name.clone(),
            name,
            design,
            structure,
        }
    }

    /// Builds a model from its configuration entry.
    pub fn from_config(config: &MuxConfig) -> Self {
        let structure = match config.structure {
            StructureKind::Tree => MuxStructure::Tree,
            StructureKind::OneLevel => MuxStructure::OneLevel,
            StructureKind::MultiLevel => MuxStructure::MultiLevel(config.levels.unwrap_or(1)),
        };
        Self {
            name: config.name.clone(),
            prefix: config.prefix.clone().unwrap_or_else(|| config.name.clone()),
            design: config.design,
            structure,
        }
    }

    /// Name of the primitive for `size` inputs, e.g. `mux_tree_size4`.
    pub fn primitive_name(&self, size: usize) -> String {
        format!("{}_size{}", self.prefix, size)
    }

    /// Levels and inputs per level for a multiplexer of `size` inputs.
    pub fn shape(&self, size: usize) -> WeftResult<(u32, u32)> {
        if size < 2 {
            return Err(InternalError::new(format!(
                "multiplexer '{}' needs at least 2 inputs, got {size}",
                self.name
            )));
        }
        if size == 2 {
            return Ok((1, 2));
        }
        let n = size as u64;
        let tree_levels = ceil_log2(n);
        Ok(match self.structure {
            MuxStructure::Tree => (tree_levels, 2),
            MuxStructure::OneLevel => (1, size as u32),
            MuxStructure::MultiLevel(requested) => {
                let levels = requested.clamp(1, tree_levels);
                let mut k = 2u64;
                while k.pow(levels) < n {
                    k += 1;
                }
                (levels, k as u32)
            }
        })
    }

    /// Number of levels of a multiplexer of `size` inputs.
    pub fn num_levels(&self, size: usize) -> WeftResult<u32> {
        self.shape(size).map(|(levels, _)| levels)
    }

    /// Number of configuration bits of a multiplexer of `size` inputs.
    pub fn num_conf_bits(&self, size: usize) -> WeftResult<u32> {
        let (levels, k) = self.shape(size)?;
        Ok(match self.design {
            DesignKind::Rram => levels * (k + 1),
            DesignKind::Cmos if size == 2 => 1,
            DesignKind::Cmos => match self.structure {
                MuxStructure::Tree => levels,
                MuxStructure::OneLevel => size as u32,
                MuxStructure::MultiLevel(_) => levels * k,
            },
        })
    }

    /// Number of reserved BL/WL lines of a multiplexer of `size` inputs.
    pub fn num_reserved_conf_bits(&self, size: usize) -> u32 {
        match self.design {
            DesignKind::Rram => size as u32,
            DesignKind::Cmos => 0,
        }
    }

    fn binary_select(&self, size: usize) -> bool {
        size == 2 || self.structure == MuxStructure::Tree
    }

    /// Configuration bits selecting input `path`.
    ///
    /// `None` (no routed path) yields all-zero bits.
    pub fn decode(&self, size: usize, path: Option<usize>) -> WeftResult<MuxBits> {
        let (levels, k) = self.shape(size)?;
        let num_bits = self.num_conf_bits(size)? as usize;
        if let Some(p) = path {
            if p >= size {
                return Err(InternalError::new(format!(
                    "path {p} is out of range for a {size}-input multiplexer '{}'",
                    self.name
                )));
            }
        }
        match self.design {
            DesignKind::Cmos => {
                let mut bits = vec![false; num_bits];
                if let Some(p) = path {
                    if self.binary_select(size) {
                        for (i, bit) in bits.iter_mut().enumerate() {
                            *bit = (p >> i) & 1 == 1;
                        }
                    } else {
                        for (level, digit) in digits(p, k, levels).enumerate() {
                            bits[level * k as usize + digit] = true;
                        }
                    }
                }
                Ok(MuxBits::Sram(bits))
            }
            DesignKind::Rram => {
                let mut bl = vec![false; num_bits];
                let mut wl = vec![false; num_bits];
                if let Some(p) = path {
                    let group = k as usize + 1;
                    for (level, digit) in digits(p, k, levels).enumerate() {
                        bl[level * group + digit] = true;
                        wl[level * group + k as usize] = true;
                    }
                }
                Ok(MuxBits::BlWl { bl, wl })
            }
        }
    }

    /// Recovers the selected input from configuration bits.
    ///
    /// One-hot encodings return `None` for all-zero bits. Binary encodings
    /// cannot distinguish "unselected" from input 0 and return `Some(0)`.
    pub fn encode(&self, size: usize, bits: &MuxBits) -> WeftResult<Option<usize>> {
        let (levels, k) = self.shape(size)?;
        let expected = self.num_conf_bits(size)? as usize;
        if bits.len() != expected {
            return Err(InternalError::new(format!(
                "{}-input multiplexer '{}' has {expected} configuration bits, got {}",
                size,
                self.name,
                bits.len()
            )));
        }
        let (values, stride) = match bits {
            MuxBits::Sram(values) if self.binary_select(size) => {
                let path = values
                    .iter()
                    .enumerate()
                    .fold(0usize, |acc, (i, &b)| if b { acc | (1 << i) } else { acc });
                return Ok(Some(path));
            }
            MuxBits::Sram(values) => (values, k as usize),
            MuxBits::BlWl { bl, .. } => (bl, k as usize + 1),
        };
        if values.iter().all(|&b| !b) {
            return Ok(None);
        }
        let mut path = 0usize;
        let mut weight = 1usize;
        for level in 0..levels as usize {
            let group = &values[level * stride..level * stride + k as usize];
            let digit = group.iter().position(|&b| b).ok_or_else(|| {
                InternalError::new(format!(
                    "level {level} of multiplexer '{}' has no selected input",
                    self.name
                ))
            })?;
            path += digit * weight;
            weight *= k as usize;
        }
        Ok(Some(path))
    }
}

fn ceil_log2(n: u64) -> u32 {
    64 - (n - 1).leading_zeros()
}

/// Base-`k` digits of `p`, least significant first.
fn digits(p: usize, k: u32, levels: u32) -> impl Iterator<Item = usize> {
    let k = k as usize;
    (0..levels).scan(p, move |rest, _| {
        let digit = *rest % k;
        *rest /= k;
        Some(digit)
    })
}

/// Multiplexer models by name.
#[derive(Clone, Debug, Default)]
pub struct MuxLibrary {
    models: HashMap<String, MuxModel>,
}

impl MuxLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the library of a technology section.
    pub fn from_config(technology: &TechnologyConfig) -> Self {
        let mut library = Self::new();
        for mux in &technology.muxes {
            library.add(MuxModel::from_config(mux));
        }
        library
    }

    /// Adds a model, replacing any model of the same name.
    pub fn add(&mut self, model: MuxModel) {
        self.models.insert(model.name.clone(), model);
    }

    /// Looks up a model by name.
    pub fn get(&self, name: &str) -> WeftResult<&MuxModel> {
        self.models
            .get(name)
            .ok_or_else(|| InternalError::new(format!("multiplexer model '{name}' is not defined")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cmos(structure: MuxStructure) -> MuxModel {
        MuxModel::new("mux", DesignKind::Cmos, structure)
    }

    fn rram(structure: MuxStructure) -> MuxModel {
        MuxModel::new("rmux", DesignKind::Rram, structure)
    }

    #[test]
    fn tree_costs() {
        let m = cmos(MuxStructure::Tree);
        assert_eq!(m.num_conf_bits(2).unwrap(), 1);
        assert_eq!(m.num_conf_bits(3).unwrap(), 2);
        assert_eq!(m.num_conf_bits(8).unwrap(), 3);
        assert_eq!(m.num_conf_bits(9).unwrap(), 4);
        assert_eq!(m.num_reserved_conf_bits(9), 0);
        assert_eq!(rram(MuxStructure::Tree).num_conf_bits(8).unwrap(), 9);
    }

    #[test]
    fn one_level_costs() {
        let m = cmos(MuxStructure::OneLevel);
        assert_eq!(m.num_conf_bits(2).unwrap(), 1);
        assert_eq!(m.num_conf_bits(5).unwrap(), 5);
        let r = rram(MuxStructure::OneLevel);
        assert_eq!(r.num_conf_bits(2).unwrap(), 3);
        assert_eq!(r.num_conf_bits(5).unwrap(), 6);
        assert_eq!(r.num_reserved_conf_bits(5), 5);
    }

    #[test]
    fn multi_level_costs() {
        let m = cmos(MuxStructure::MultiLevel(2));
        // 9 inputs in two levels of 3
        assert_eq!(m.shape(9).unwrap(), (2, 3));
        assert_eq!(m.num_conf_bits(9).unwrap(), 6);
        // 10 inputs need k = 4
        assert_eq!(m.shape(10).unwrap(), (2, 4));
        // more levels than a tree would need are clamped
        assert_eq!(cmos(MuxStructure::MultiLevel(5)).shape(4).unwrap(), (2, 2));
        assert_eq!(rram(MuxStructure::MultiLevel(2)).num_conf_bits(9).unwrap(), 8);
    }

    #[test]
    fn size_below_two_is_rejected() {
        assert!(cmos(MuxStructure::Tree).num_conf_bits(1).is_err());
        assert!(cmos(MuxStructure::Tree).decode(0, None).is_err());
    }

    #[test]
    fn unselected_is_all_zero() {
        for model in [cmos(MuxStructure::OneLevel), rram(MuxStructure::Tree)] {
            match model.decode(6, None).unwrap() {
                MuxBits::Sram(bits) => assert!(bits.iter().all(|b| !b)),
                MuxBits::BlWl { bl, wl } => {
                    assert!(bl.iter().chain(wl.iter()).all(|b| !b));
                }
            }
            assert_eq!(model.encode(6, &model.decode(6, None).unwrap()).unwrap(), None);
        }
    }

    #[test]
    fn tree_bits_are_binary_path() {
        let m = cmos(MuxStructure::Tree);
        assert_eq!(
            m.decode(8, Some(6)).unwrap(),
            MuxBits::Sram(vec![false, true, true])
        );
    }

    #[test]
    fn rram_groups_set_wl_at_output_line() {
        let m = rram(MuxStructure::Tree);
        let MuxBits::BlWl { bl, wl } = m.decode(4, Some(2)).unwrap() else {
            panic!("expected BL/WL bits");
        };
        // two levels of 2:1, groups of 3 lines
        assert_eq!(bit_string(&bl), "100010");
        assert_eq!(bit_string(&wl), "001001");
    }

    #[test]
    fn decode_round_trips() {
        let mut rng = StdRng::seed_from_u64(42);
        let structures = [
            MuxStructure::Tree,
            MuxStructure::OneLevel,
            MuxStructure::MultiLevel(2),
            MuxStructure::MultiLevel(3),
        ];
        for _ in 0..200 {
            let size = rng.gen_range(2..40);
            let structure = structures[rng.gen_range(0..structures.len())];
            let model = if rng.gen_bool(0.5) {
                cmos(structure)
            } else {
                rram(structure)
            };
            let path = rng.gen_range(0..size);
            let bits = model.decode(size, Some(path)).unwrap();
            assert_eq!(bits.len(), model.num_conf_bits(size).unwrap() as usize);
            assert_eq!(
                model.encode(size, &bits).unwrap(),
                Some(path),
                "{structure:?} {:?} size {size}",
                model.design
            );
        }
    }

    #[test]
    fn out_of_range_path_is_rejected() {
        assert!(cmos(MuxStructure::Tree).decode(4, Some(4)).is_err());
    }

    #[test]
    fn library_from_config() {
        let lib = MuxLibrary::from_config(&TechnologyConfig::default());
        let m = lib.get("mux_tree").unwrap();
        assert_eq!(m.primitive_name(4), "mux_tree_size4");
        assert!(lib.get("missing").is_err());
    }
}
