//! Region search for the BET and BET+ESW analyses.
//!
//! Candidate regions `[p, q)` are scanned with `q` descending from the last row of
//! the truncated table and `p` ascending. Row `q` itself always exists, since it
//! supplies the closing pressure of the region. A region becomes a candidate when it passes the gates:
//! 1. consistency criteria 1 and 2
//! 2. F-test p-value, both t-test p-values and the Shapiro–Wilk p-value within
//!    their limits
//! 3. R² above the floor
//!
//! The first candidate that also satisfies criteria 3 and 4, with R² above the
//! cutoff, ends the search. Otherwise the earliest candidate with the highest
//! consistency score wins.
//!
//! All starts for one `q` are evaluated in parallel; the scan over them is
//! sequential so the outcome is identical to a serial search.

use log::debug;
use rayon::prelude::*;

use crate::domain::{AnalysisConfig, PreparedRow, ReferenceExtrema, RegionFit, Selection, SelectionMode};
use crate::fit::prepare::global_bet_y2_max;
use crate::fit::region::{EvalOptions, evaluate_region};

/// Loop limits of one region search over a truncated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    /// Rows `[0, end)` take part in the search.
    pub end: usize,
    /// Largest `q`: the last row of the truncated table.
    pub last: usize,
    /// `q` stays strictly above this.
    pub end_low_limit: usize,
    /// `p` stays at or below this.
    pub start_high_limit: usize,
    /// A region needs more than this many points.
    pub min_span: usize,
    /// `q - p` never exceeds this.
    pub max_span: usize,
}

impl SearchBounds {
    /// Derive the limits for `n` prepared rows, or `None` when the mode cannot
    /// run (no usable bound, no ESW minimum, or an ESW minimum at row 0).
    pub fn new(
        rows: &[PreparedRow],
        extrema: &ReferenceExtrema,
        mode: SelectionMode,
        config: &AnalysisConfig,
    ) -> Option<Self> {
        let bound = extrema.con1_limit.or_else(|| global_bet_y2_max(rows))?;
        let end = (bound + 2).min(rows.len());
        let last = end.checked_sub(1)?;
        let min_span = config.min_line_length.saturating_sub(1);

        let (end_low_limit, start_high_limit) = match mode {
            SelectionMode::Bet => (min_span, last.saturating_sub(min_span)),
            SelectionMode::BetEsw => {
                let m = extrema.esw_minimum?;
                (m + 1, m.checked_sub(1)?)
            }
        };

        Some(Self {
            end,
            last,
            end_low_limit,
            start_high_limit,
            min_span,
            max_span: config.max_region_span,
        })
    }

    /// Region ends in scan order.
    pub fn ends(&self) -> impl Iterator<Item = usize> + '_ {
        (self.end_low_limit + 1..=self.last).rev()
    }

    /// Admissible starts for end `q`, ascending.
    pub fn starts(&self, q: usize) -> impl Iterator<Item = usize> + '_ {
        (0..q.saturating_sub(self.min_span))
            .filter(move |&p| p <= self.start_high_limit && q - p <= self.max_span)
    }

    /// Every region the search may visit, in scan order.
    pub fn regions(&self) -> Vec<(usize, usize)> {
        self.ends()
            .flat_map(|q| self.starts(q).map(move |p| (p, q)))
            .collect()
    }
}

/// Whether a fitted region may be considered at all.
pub fn passes_gates(fit: &RegionFit, config: &AnalysisConfig) -> bool {
    fit.con1
        && fit.con2
        && fit.stats.f_pvalue < config.f_pvalue_max
        && fit.stats.max_t_pvalue() < config.t_pvalue_max
        && fit.stats.shapiro_pvalue > config.shapiro_pvalue_min
        && fit.stats.r_squared > config.r2_min
}

/// Whether a candidate is good enough to stop searching.
pub fn is_final(fit: &RegionFit, min_span: usize, config: &AnalysisConfig) -> bool {
    fit.consistency_score() == 2 && fit.length() > min_span && fit.stats.r_squared > config.r2_cutoff
}

/// Search the prepared rows for the best linear region.
///
/// Returned indices refer to the full `rows` table.
pub fn select_region(
    rows: &[PreparedRow],
    extrema: &ReferenceExtrema,
    mode: SelectionMode,
    config: &AnalysisConfig,
) -> Option<Selection> {
    let Some(bounds) = SearchBounds::new(rows, extrema, mode, config) else {
        debug!("{}: no search bounds (extrema {:?}).", mode.display_name(), extrema);
        return None;
    };
    let rows = &rows[..bounds.end];
    let opts = EvalOptions {
        cross_section: config.adsorbate.cross_section(),
        zero_intercept_sentinel: config.zero_intercept_sentinel,
    };

    let mut best: Option<(Selection, u8)> = None;
    let mut evaluated = 0usize;

    for q in bounds.ends() {
        let starts: Vec<usize> = bounds.starts(q).collect();
        evaluated += starts.len();

        // Parallel evaluation preserves the start order on collect.
        let fits: Vec<RegionFit> = starts
            .par_iter()
            .filter_map(|&p| match evaluate_region(rows, p, q, extrema.con1_limit, &opts) {
                Ok(fit) => Some(fit),
                Err(err) => {
                    debug!("Skipping region [{p}, {q}): {err}");
                    None
                }
            })
            .collect();

        for fit in fits.iter().filter(|fit| passes_gates(fit, config)) {
            let selection = Selection {
                start: fit.start,
                end: fit.end,
            };
            let score = fit.consistency_score();

            if is_final(fit, bounds.min_span, config) {
                debug!(
                    "{}: accepted [{}, {}) after {evaluated} regions (R² {:.6}).",
                    mode.display_name(),
                    fit.start,
                    fit.end,
                    fit.stats.r_squared
                );
                return Some(selection);
            }

            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((selection, score)),
            }
        }
    }

    debug!(
        "{}: scanned {evaluated} regions, best {:?}.",
        mode.display_name(),
        best.map(|(s, score)| (s.start, s.end, score))
    );
    best.map(|(selection, _)| selection)
}
