//! Re-projection of a `Scorecard` into the payload the front end reads.
//!
//! The front end has historically read the score from several fields, so
//! every alias carries the same number: the sum recomputed here from the
//! clamped axes. The rubric's `total_final` is not surfaced as the score.

use serde::Serialize;

use crate::scorecard::engine::{Axis, Scorecard, AXIS_MAX, SCORE_MAX};

/// Axis scores under lower-case keys, in rubric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisScores {
    pub rol: u32,
    pub objetivo: u32,
    pub tono: u32,
    pub formato: u32,
    pub longitud: u32,
    pub calidad: u32,
}

impl AxisScores {
    fn from_scorecard(scorecard: &Scorecard) -> Self {
        let axis = |a: Axis| scorecard.axis(a).min(AXIS_MAX);
        Self {
            rol: axis(Axis::Rol),
            objetivo: axis(Axis::Objetivo),
            tono: axis(Axis::Tono),
            formato: axis(Axis::Formato),
            longitud: axis(Axis::Longitud),
            calidad: axis(Axis::Calidad),
        }
    }

    pub fn sum(&self) -> u32 {
        self.rol + self.objetivo + self.tono + self.formato + self.longitud + self.calidad
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedScorecard {
    pub criteria: AxisScores,
    pub total: u32,
    pub total_raw: u32,
    pub total_final: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontDebug {
    pub sum_from_criteria: u32,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontPayload {
    pub ok: bool,
    pub criteria: AxisScores,
    pub total: u32,
    pub score: u32,
    pub overall: u32,
    pub total_raw: u32,
    pub total_final: u32,
    pub max: u32,
    pub critique: String,
    pub scorecard: NestedScorecard,
    pub debug: FrontDebug,
}

impl From<&Scorecard> for FrontPayload {
    fn from(scorecard: &Scorecard) -> Self {
        let criteria = AxisScores::from_scorecard(scorecard);
        let total = criteria.sum();

        FrontPayload {
            ok: true,
            criteria,
            total,
            score: total,
            overall: total,
            total_raw: total,
            total_final: total,
            max: SCORE_MAX,
            critique: scorecard.critique.clone(),
            scorecard: NestedScorecard {
                criteria,
                total,
                total_raw: total,
                total_final: total,
                max: SCORE_MAX,
            },
            debug: FrontDebug {
                sum_from_criteria: total,
                mode: scorecard.mode.clone(),
            },
        }
    }
}
