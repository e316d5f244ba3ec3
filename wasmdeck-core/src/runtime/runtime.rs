//! Engine/store/linker construction and module instantiation.
//!
//! Responsibilities:
//! - Create a Wasmtime `Engine`/`Store` with feature flags enabled.
//! - Define host imports under the capability modules matching the guest ABI.
//! - Instantiate a compiled `wasmtime::Module`.
//! - Resolve the guest's exported memory and entrypoints.

use crate::{abi, state::HostState};

use wasmtime::{Instance, Linker, Memory, Module, Store};

/// Host-side runtime container.
pub struct Runtime {
    pub engine: wasmtime::Engine,
    pub store: Store<HostState>,
    pub linker: Linker<HostState>,
}

impl Runtime {
    /// Create a new Wasmtime runtime with a broad set of WebAssembly features
    /// enabled, so guests built by modern toolchains validate without fuss.
    pub fn new(state: HostState) -> Result<Self, anyhow::Error> {
        let mut cfg = wasmtime::Config::new();

        // Broadly supported/expected features for "modern" Wasm modules.
        cfg.wasm_multi_value(true);
        cfg.wasm_bulk_memory(true);
        cfg.wasm_reference_types(true);
        cfg.wasm_simd(true);

        // Additional proposal support.
        cfg.wasm_tail_call(true);

        let engine = wasmtime::Engine::new(&cfg)?;
        let store = Store::new(&engine, state);
        let linker = Linker::new(&engine);

        Ok(Self { engine, store, linker })
    }

    /// Define all host imports expected by guests.
    ///
    /// Must be called before `instantiate`.
    pub fn define_imports(&mut self) -> Result<(), anyhow::Error> {
        super::imports::define_imports(&mut self.linker)
    }

    /// Instantiate a module and wire up exports/memory.
    pub fn instantiate(
        &mut self,
        module: &Module,
    ) -> Result<(Instance, abi::GuestEntrypoints, Memory), anyhow::Error> {
        let instance = self.linker.instantiate(&mut self.store, module)?;

        let memory = instance
            .get_memory(&mut self.store, "memory")
            .ok_or_else(|| anyhow::anyhow!("guest does not export linear `memory`"))?;

        // Validates the required `deck_frame` export as part of resolution.
        let entrypoints = abi::GuestEntrypoints::resolve(&instance, &mut self.store)?;

        Ok((instance, entrypoints, memory))
    }
}
