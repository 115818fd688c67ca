// Diagnostics — stream counters exposed over the control API.

pub mod stats;
