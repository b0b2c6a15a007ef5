//! Travel cost matrices

/// Directed, asymmetric travel costs between locations.
/// Both matrices are stored row-major: `from * count + to`.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelGraph {
    count: usize,
    losses: Vec<i64>,
    gains: Vec<i64>,
}

impl TravelGraph {
    /// Build from square row matrices. Shapes are checked by `SimConfig::validate`.
    pub fn from_rows(losses: &[Vec<u32>], gains: &[Vec<u32>]) -> Self {
        let flatten = |rows: &[Vec<u32>]| -> Vec<i64> {
            rows.iter().flatten().map(|&c| c as i64).collect()
        };
        Self {
            count: losses.len(),
            losses: flatten(losses),
            gains: flatten(gains),
        }
    }

    /// Number of locations
    #[inline(always)]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Time lost travelling directly from `from` to `to`
    #[inline(always)]
    pub fn loss(&self, from: usize, to: usize) -> i64 {
        self.losses[from * self.count + to]
    }

    /// Time refunded travelling directly from `from` to `to`
    #[inline(always)]
    pub fn gain(&self, from: usize, to: usize) -> i64 {
        self.gains[from * self.count + to]
    }

    /// Net cost of the hop
    #[inline(always)]
    pub fn net(&self, from: usize, to: usize) -> i64 {
        self.loss(from, to) - self.gain(from, to)
    }
}
