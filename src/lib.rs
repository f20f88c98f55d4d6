//! Client library for the ChainFly solar-loan backend: an authenticated API
//! gateway, the loan/subsidy arithmetic its calculators use, and the
//! application wizard state.

pub mod api;
pub mod bootstrap;
pub mod chainfly;
pub mod core;
pub mod draft;
pub mod finance;
