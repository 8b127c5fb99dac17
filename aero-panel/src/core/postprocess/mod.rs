//! Surface velocities, pressures and force integration
//!
//! ## Module Organization
//!
//! - [`velocities`] - doublet-gradient surface velocities and field probes
//! - [`forces`] - pressure coefficients, near-field and far-field loads

pub mod forces;
pub mod velocities;

pub use forces::{
    body_force_and_moment, induced_force, pressure_coefficients, span_loading, trefftz_drag,
    vorton_drag,
};
pub use velocities::{field_velocity, local_velocities, surface_velocities};
