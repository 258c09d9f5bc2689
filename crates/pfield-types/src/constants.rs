// ─────────────────────────────────────────────────────────────────────
// PField — Constants
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
/// Elementary charge (C)
pub const Q_E: f64 = 1.602_176_634e-19;

/// Hydrogen (proton) mass used as the species mass unit (kg)
pub const M_H: f64 = 1.672_621_92e-27;

/// Electron mass (kg)
pub const M_E: f64 = 9.109_383_7e-31;

/// Centimetre (m). The GUI writes every length in centimetres.
pub const CM: f64 = 1e-2;

/// Millimetre (m)
pub const MM: f64 = 1e-3;

/// Electron-volt (J)
pub const EV_TO_J: f64 = Q_E;

/// Kilo-electron-volt (J). The GUI writes particle energies in keV.
pub const KEV_TO_J: f64 = 1e3 * Q_E;

/// Carbon mass number, in units of `M_H`.
pub const CARBON_MASS_MH: f64 = 12.0;

/// Oxygen mass number, in units of `M_H`.
pub const OXYGEN_MASS_MH: f64 = 16.0;
