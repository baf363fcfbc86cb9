//! The calculus interface and the sealed JSON entry points built on it

use crate::calculi::{
    Dpll, FoResolution, FoSequent, FoTableaux, PropResolution, PropSequent, PropTableaux,
    SignedModalTableaux,
};
use crate::error::{LogicError, Result};
use crate::misc::log::targets;
use crate::seal::{ProtectedState, Sealed};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result of a closure check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseMessage {
    pub closed: bool,
    pub msg: String,
}

impl CloseMessage {
    pub fn new(closed: bool, msg: impl Into<String>) -> Self {
        CloseMessage {
            closed,
            msg: msg.into(),
        }
    }
}

/// A proof calculus: how to start a proof, how moves change it, and when it
/// is finished
pub trait Calculus {
    const IDENTIFIER: &'static str;

    type Params: DeserializeOwned + Default;
    type State: ProtectedState + Serialize + DeserializeOwned;
    type Move: DeserializeOwned + fmt::Debug;

    fn parse_formula(formula: &str, params: Self::Params) -> Result<Self::State>;

    fn apply_move(state: Self::State, mv: Self::Move) -> Result<Self::State>;

    fn check_close(state: &Self::State) -> CloseMessage;
}

/// Parse `formula` into a fresh sealed state
pub fn parse<C: Calculus>(formula: &str, params_json: Option<&str>) -> Result<String> {
    let params = match params_json {
        Some(json) if !json.trim().is_empty() => serde_json::from_str(json)?,
        _ => C::Params::default(),
    };
    let state = C::parse_formula(formula, params)?;
    log::debug!(target: targets::CALCULUS, "{}: parsed '{}'", C::IDENTIFIER, formula);
    Sealed::new(state).to_json()
}

/// Verify the inbound state, apply one move and reseal
pub fn apply_move<C: Calculus>(state_json: &str, move_json: &str) -> Result<String> {
    let state = Sealed::<C::State>::open_json(state_json)?;
    let mv: C::Move = serde_json::from_str(move_json)?;
    log::debug!(target: targets::CALCULUS, "{}: applying {:?}", C::IDENTIFIER, mv);
    let state = C::apply_move(state, mv)?;
    Sealed::new(state).to_json()
}

/// Verify the inbound state and report whether the proof is finished
pub fn check_close<C: Calculus>(state_json: &str) -> Result<CloseMessage> {
    let state = Sealed::<C::State>::open_json(state_json)?;
    let message = C::check_close(&state);
    log::debug!(target: targets::CALCULUS, "{}: closed = {}", C::IDENTIFIER, message.closed);
    Ok(message)
}

/// Runtime selection of a calculus by its identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalculusKind {
    PropTableaux,
    FoTableaux,
    PropResolution,
    FoResolution,
    PropSequent,
    FoSequent,
    Dpll,
    SignedModalTableaux,
}

impl CalculusKind {
    pub const ALL: [CalculusKind; 8] = [
        CalculusKind::PropTableaux,
        CalculusKind::FoTableaux,
        CalculusKind::PropResolution,
        CalculusKind::FoResolution,
        CalculusKind::PropSequent,
        CalculusKind::FoSequent,
        CalculusKind::Dpll,
        CalculusKind::SignedModalTableaux,
    ];

    pub fn identifier(&self) -> &'static str {
        match self {
            CalculusKind::PropTableaux => PropTableaux::IDENTIFIER,
            CalculusKind::FoTableaux => FoTableaux::IDENTIFIER,
            CalculusKind::PropResolution => PropResolution::IDENTIFIER,
            CalculusKind::FoResolution => FoResolution::IDENTIFIER,
            CalculusKind::PropSequent => PropSequent::IDENTIFIER,
            CalculusKind::FoSequent => FoSequent::IDENTIFIER,
            CalculusKind::Dpll => Dpll::IDENTIFIER,
            CalculusKind::SignedModalTableaux => SignedModalTableaux::IDENTIFIER,
        }
    }

    pub fn parse(&self, formula: &str, params_json: Option<&str>) -> Result<String> {
        match self {
            CalculusKind::PropTableaux => parse::<PropTableaux>(formula, params_json),
            CalculusKind::FoTableaux => parse::<FoTableaux>(formula, params_json),
            CalculusKind::PropResolution => parse::<PropResolution>(formula, params_json),
            CalculusKind::FoResolution => parse::<FoResolution>(formula, params_json),
            CalculusKind::PropSequent => parse::<PropSequent>(formula, params_json),
            CalculusKind::FoSequent => parse::<FoSequent>(formula, params_json),
            CalculusKind::Dpll => parse::<Dpll>(formula, params_json),
            CalculusKind::SignedModalTableaux => parse::<SignedModalTableaux>(formula, params_json),
        }
    }

    pub fn apply_move(&self, state_json: &str, move_json: &str) -> Result<String> {
        match self {
            CalculusKind::PropTableaux => apply_move::<PropTableaux>(state_json, move_json),
            CalculusKind::FoTableaux => apply_move::<FoTableaux>(state_json, move_json),
            CalculusKind::PropResolution => apply_move::<PropResolution>(state_json, move_json),
            CalculusKind::FoResolution => apply_move::<FoResolution>(state_json, move_json),
            CalculusKind::PropSequent => apply_move::<PropSequent>(state_json, move_json),
            CalculusKind::FoSequent => apply_move::<FoSequent>(state_json, move_json),
            CalculusKind::Dpll => apply_move::<Dpll>(state_json, move_json),
            CalculusKind::SignedModalTableaux => {
                apply_move::<SignedModalTableaux>(state_json, move_json)
            }
        }
    }

    pub fn check_close(&self, state_json: &str) -> Result<CloseMessage> {
        match self {
            CalculusKind::PropTableaux => check_close::<PropTableaux>(state_json),
            CalculusKind::FoTableaux => check_close::<FoTableaux>(state_json),
            CalculusKind::PropResolution => check_close::<PropResolution>(state_json),
            CalculusKind::FoResolution => check_close::<FoResolution>(state_json),
            CalculusKind::PropSequent => check_close::<PropSequent>(state_json),
            CalculusKind::FoSequent => check_close::<FoSequent>(state_json),
            CalculusKind::Dpll => check_close::<Dpll>(state_json),
            CalculusKind::SignedModalTableaux => check_close::<SignedModalTableaux>(state_json),
        }
    }
}

impl fmt::Display for CalculusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl FromStr for CalculusKind {
    type Err = LogicError;

    fn from_str(s: &str) -> Result<Self> {
        CalculusKind::ALL
            .iter()
            .copied()
            .find(|k| k.identifier() == s)
            .ok_or_else(|| LogicError::JsonParse(format!("Unknown calculus '{}'", s)))
    }
}
