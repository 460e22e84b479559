//! Application state wiring the core services to infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gatehouse_core::admission::AdmissionController;
use gatehouse_core::breaker::CircuitBreaker;
use gatehouse_core::location::LocationResolver;
use gatehouse_core::memory::ConversationMemoryStore;
use gatehouse_core::plan::PlanService;
use gatehouse_core::wizard::SessionWizard;
use gatehouse_infra::handoff::NullHandoffSink;
use gatehouse_infra::plan_file::FilePlanStore;
use gatehouse_infra::resolve_data_dir;
use gatehouse_infra::roles::NullRoleDirectory;
use gatehouse_types::config::GatehouseConfig;

/// Concrete plan service pinned to the infra implementations.
pub type ConcretePlanService = PlanService<FilePlanStore, NullRoleDirectory>;

/// Concrete wizard pinned to the infra handoff sink.
pub type ConcreteWizard = SessionWizard<NullHandoffSink>;

/// Shared state behind the CLI and the admin HTTP surface.
///
/// The event-stream transport embeds `gatehouse-core` directly and builds
/// its own `ChatGateway` over this same admission state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatehouseConfig,
    pub breaker: Arc<CircuitBreaker>,
    pub controller: Arc<AdmissionController>,
    pub memory: Arc<ConversationMemoryStore>,
    pub resolver: Arc<LocationResolver>,
    pub plans: Arc<ConcretePlanService>,
    pub wizard: Arc<ConcreteWizard>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Wire all services: load the plan override table, build the
    /// admission singletons.
    pub async fn init(config: GatehouseConfig) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let plan_store = FilePlanStore::open(data_dir.join("plans.json")).await?;
        let plans = Arc::new(PlanService::new(plan_store, NullRoleDirectory));

        let breaker = Arc::new(CircuitBreaker::new(Duration::from_secs(
            config.breaker.default_block_secs,
        )));
        let controller = Arc::new(AdmissionController::new(&config, breaker.clone()));
        let memory = Arc::new(ConversationMemoryStore::new(&config.memory));
        let resolver = Arc::new(LocationResolver::new(&config.location));
        let wizard = Arc::new(SessionWizard::new(NullHandoffSink));

        Ok(Self {
            config,
            breaker,
            controller,
            memory,
            resolver,
            plans,
            wizard,
            data_dir,
        })
    }
}
