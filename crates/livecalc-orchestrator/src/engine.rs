//! The engine capability contract the orchestrator dispatches against —
//! tagged variants plus a trait/interface abstraction in place of virtual
//! inheritance — plus the lifecycle state machine every engine
//! implementation is driven through.

use rayon::prelude::*;

use livecalc_auth::TokenHandler;
use livecalc_cache::TableCache;
use livecalc_core::{ExpenseAssumptions, LapseTable, MortalityTable, PolicySet};
use livecalc_kernel::{generate_scenarios, project_policy, ProjectionConfig, ScenarioGeneratorParams};
use livecalc_transport::HttpTransport;

use crate::buffer::{decode_policy_buffer, encode_result_buffer, ResultRecord};
use crate::credentials::Credentials;
use crate::error::OrchestratorError;

/// Engine lifecycle states. A fresh engine starts
/// `Uninitialized`; `EngineLifecycle` rejects any operation attempted out
/// of order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
    Running,
    Error,
    Disposed,
}

#[derive(Clone, Debug)]
pub struct EngineInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Table identity (name + version) the engine resolves at initialization.
#[derive(Clone, Debug)]
pub struct TableRef {
    pub name: String,
    pub version: String,
}

/// Everything an [`Engine`] needs to initialize: which tables to resolve,
/// scenario generation parameters, and the projection knobs (stress
/// multipliers, UDF hook, retention flag).
#[derive(Clone)]
pub struct EngineConfig {
    pub mortality_table: TableRef,
    pub lapse_table: TableRef,
    pub expense_table: TableRef,
    pub scenario_params: ScenarioGeneratorParams,
    pub num_scenarios: usize,
    pub seed: u64,
    /// Policy records on the wire carry no term field; the engine applies
    /// this term uniformly to every decoded policy.
    pub default_term_years: u8,
    pub projection: ProjectionConfig,
}

/// The capability set every compute engine exposes to the orchestrator:
/// initialize once, report identity, process chunks repeatedly, dispose
/// once. Implementations must not retain state across a `dispose()`.
pub trait Engine {
    fn initialize(&mut self, config: EngineConfig, credentials: Credentials) -> Result<(), OrchestratorError>;
    fn info(&self) -> EngineInfo;
    fn run_chunk(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), OrchestratorError>;
    fn dispose(&mut self);
}

/// Wraps any [`Engine`] with a lifecycle state machine: every
/// operation is checked against the current state before being forwarded,
/// and a failed `initialize`/`run_chunk` moves the engine to `Error`
/// rather than leaving it in a state that looks usable.
pub struct EngineLifecycle<E: Engine> {
    engine: E,
    state: EngineState,
}

impl<E: Engine> EngineLifecycle<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: EngineState::Uninitialized,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn info(&self) -> EngineInfo {
        self.engine.info()
    }

    pub fn initialize(
        &mut self,
        config: EngineConfig,
        credentials: Credentials,
    ) -> Result<(), OrchestratorError> {
        if self.state != EngineState::Uninitialized {
            return Err(OrchestratorError::InvalidState {
                operation: "initialize",
                state: self.state,
            });
        }
        self.state = EngineState::Initializing;
        match self.engine.initialize(config, credentials) {
            Ok(()) => {
                self.state = EngineState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = EngineState::Error;
                Err(e)
            }
        }
    }

    pub fn run_chunk(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), OrchestratorError> {
        if self.state != EngineState::Ready {
            return Err(OrchestratorError::InvalidState {
                operation: "run_chunk",
                state: self.state,
            });
        }
        self.state = EngineState::Running;
        match self.engine.run_chunk(input, output) {
            Ok(()) => {
                self.state = EngineState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = EngineState::Error;
                Err(e)
            }
        }
    }

    pub fn dispose(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.engine.dispose();
        self.state = EngineState::Disposed;
    }
}

/// Fallback mortality qx used when a table fails to resolve at
/// initialization — a flat, conservative rate so a single unreachable
/// table doesn't abort the whole run. Any resolve-scalar failure during
/// projection is treated as non-fatal.
const FALLBACK_MORTALITY_QX: f64 = 0.01;
const FALLBACK_LAPSE_RATE: f64 = 0.05;

/// Resolves its tables and scenarios through `livecalc-assumptions` at
/// `initialize`, then projects decoded policy records against them on
/// every `run_chunk`.
pub struct ProjectionEngine {
    resolver: Option<livecalc_assumptions::AssumptionResolver>,
    mortality: Option<MortalityTable>,
    lapse: Option<LapseTable>,
    expense: Option<ExpenseAssumptions>,
    scenarios: Option<livecalc_core::ScenarioSet>,
    config: Option<EngineConfig>,
}

impl ProjectionEngine {
    pub fn new() -> Self {
        Self {
            resolver: None,
            mortality: None,
            lapse: None,
            expense: None,
            scenarios: None,
            config: None,
        }
    }
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionEngine {
    /// Audit map of table name to the source each table was last resolved
    /// from, `None` before `initialize`.
    pub fn resolved_versions(&self) -> Option<std::collections::HashMap<String, String>> {
        self.resolver.as_ref().map(|r| r.resolved_versions())
    }
}

impl Engine for ProjectionEngine {
    fn initialize(&mut self, config: EngineConfig, credentials: Credentials) -> Result<(), OrchestratorError> {
        let am_url = credentials.am_url.clone().ok_or(OrchestratorError::MissingAmUrl)?;
        let am_token = credentials
            .am_token
            .clone()
            .ok_or(OrchestratorError::MissingAmUrl)?;

        let transport = HttpTransport::new(&am_url)
            .map_err(|e| OrchestratorError::InitializationFailed(e.to_string()))?;
        let token_handler = TokenHandler::with_token(&am_url, am_token)
            .map_err(|e| OrchestratorError::InitializationFailed(e.to_string()))?;
        let cache = match credentials.cache_dir {
            Some(dir) => TableCache::with_root(dir),
            None => TableCache::new(),
        };
        let resolver = livecalc_assumptions::AssumptionResolver::new(transport, token_handler, cache);

        let mortality = resolve_mortality_or_fallback(&resolver, &config.mortality_table);
        let lapse = resolve_lapse_or_fallback(&resolver, &config.lapse_table);
        let expense = resolve_expense_or_fallback(&resolver, &config.expense_table);

        let scenarios = generate_scenarios(config.num_scenarios, &config.scenario_params, config.seed);

        self.resolver = Some(resolver);
        self.mortality = Some(mortality);
        self.lapse = Some(lapse);
        self.expense = Some(expense);
        self.scenarios = Some(scenarios);
        self.config = Some(config);

        Ok(())
    }

    fn info(&self) -> EngineInfo {
        EngineInfo {
            name: "livecalc-projection-engine",
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    fn run_chunk(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), OrchestratorError> {
        let config = self
            .config
            .as_ref()
            .ok_or(OrchestratorError::InitializationFailed("not initialized".into()))?;
        let mortality = self.mortality.as_ref().unwrap();
        let lapse = self.lapse.as_ref().unwrap();
        let expense = self.expense.as_ref().unwrap();
        let scenarios = self.scenarios.as_ref().unwrap();

        let records = decode_policy_buffer(input)?;
        let mut policies = PolicySet::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            policies.add(record.to_policy(index, config.default_term_years)?);
        }

        let results: Vec<ResultRecord> = scenarios
            .as_slice()
            .par_iter()
            .flat_map(|scenario| {
                policies
                    .iter()
                    .map(|policy| {
                        let projection =
                            project_policy(policy, mortality, lapse, expense, scenario, &config.projection);
                        ResultRecord {
                            scenario_id: scenario.index as u32,
                            policy_id: policy.policy_id as u32,
                            npv: projection.npv,
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        output.clear();
        output.extend_from_slice(&encode_result_buffer(&results));
        Ok(())
    }

    fn dispose(&mut self) {
        self.resolver = None;
        self.mortality = None;
        self.lapse = None;
        self.expense = None;
        self.scenarios = None;
        self.config = None;
    }
}

fn resolve_mortality_or_fallback(
    resolver: &livecalc_assumptions::AssumptionResolver,
    table: &TableRef,
) -> MortalityTable {
    match resolver.resolve(&table.name, &table.version) {
        Ok(data) => MortalityTable::from_flat(data).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "resolved mortality table has wrong shape, using fallback");
            fallback_mortality()
        }),
        Err(e) => {
            tracing::warn!(error = %e, table = %table.name, version = %table.version, "failed to resolve mortality table, using fallback");
            fallback_mortality()
        }
    }
}

fn resolve_lapse_or_fallback(
    resolver: &livecalc_assumptions::AssumptionResolver,
    table: &TableRef,
) -> LapseTable {
    match resolver.resolve(&table.name, &table.version) {
        Ok(data) => LapseTable::from_flat(data).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "resolved lapse table has wrong shape, using fallback");
            fallback_lapse()
        }),
        Err(e) => {
            tracing::warn!(error = %e, table = %table.name, version = %table.version, "failed to resolve lapse table, using fallback");
            fallback_lapse()
        }
    }
}

fn resolve_expense_or_fallback(
    resolver: &livecalc_assumptions::AssumptionResolver,
    table: &TableRef,
) -> ExpenseAssumptions {
    match resolver.resolve(&table.name, &table.version) {
        Ok(data) => ExpenseAssumptions::from_flat(&data).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "resolved expense table has wrong shape, using fallback");
            fallback_expense()
        }),
        Err(e) => {
            tracing::warn!(error = %e, table = %table.name, version = %table.version, "failed to resolve expense table, using fallback");
            fallback_expense()
        }
    }
}

fn fallback_mortality() -> MortalityTable {
    MortalityTable::from_flat(vec![FALLBACK_MORTALITY_QX; livecalc_core::constants::MORTALITY_TABLE_LEN])
        .expect("fallback mortality table has the correct fixed length")
}

fn fallback_lapse() -> LapseTable {
    LapseTable::from_flat(vec![FALLBACK_LAPSE_RATE; livecalc_core::constants::LAPSE_TABLE_LEN])
        .expect("fallback lapse table has the correct fixed length")
}

fn fallback_expense() -> ExpenseAssumptions {
    ExpenseAssumptions::from_flat(&[0.0, 0.0, 0.0, 0.0])
        .expect("fallback expense table has the correct fixed length")
}
