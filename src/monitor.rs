//! Memory pressure sampling
//!
//! The coordinator polls the monitor before admitting a keyword. A reading above the
//! ceiling is reported to the caller; the monitor itself never blocks or delays.

use std::sync::Mutex;

use sysinfo::System;

/// Source of memory utilization readings, in percent of total memory in use
pub trait MemoryProbe: Send + Sync {
    fn memory_percent(&self) -> f64;
}

/// System-wide memory readings via `sysinfo`
pub struct SystemMemory {
    system: Mutex<System>,
}

impl SystemMemory {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemory {
    fn memory_percent(&self) -> f64 {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return 0.0;
        }
        system.used_memory() as f64 / total as f64 * 100.0
    }
}

/// A fixed reading, for callers that want to disable sampling
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory(pub f64);

impl MemoryProbe for FixedMemory {
    fn memory_percent(&self) -> f64 {
        self.0
    }
}

/// Reports whether memory utilization is under a configured ceiling
pub struct ResourceMonitor {
    max_memory_percent: f64,
    probe: Box<dyn MemoryProbe>,
}

impl ResourceMonitor {
    /// Monitor backed by system memory readings
    pub fn new(max_memory_percent: f64) -> Self {
        Self::with_probe(max_memory_percent, SystemMemory::new())
    }

    /// Monitor backed by a custom probe
    pub fn with_probe(max_memory_percent: f64, probe: impl MemoryProbe + 'static) -> Self {
        Self {
            max_memory_percent,
            probe: Box::new(probe),
        }
    }

    /// Configured ceiling in percent
    pub fn max_memory_percent(&self) -> f64 {
        self.max_memory_percent
    }

    /// Current utilization in percent
    pub fn memory_percent(&self) -> f64 {
        self.probe.memory_percent()
    }

    /// Sample once and return the reading when it exceeds the ceiling
    pub fn over_ceiling(&self) -> Option<f64> {
        let percent = self.memory_percent();
        (percent > self.max_memory_percent).then_some(percent)
    }

    /// True when utilization is at or below the ceiling
    pub fn check_resources(&self) -> bool {
        self.over_ceiling().is_none()
    }
}
