//! `shopwright run`: feature discovery, filtering and the cucumber hooks

use crate::world::ShopWorld;
use cucumber::{cli, event, gherkin, writer::Stats as _, World as _};
use regex::Regex;
use shopwright::driver::AppiumFactory;
use shopwright::trace::SuiteSummary;
use shopwright::{ScenarioInfo, SessionState, SuiteState, TraceHandle};
use shopwright_cli::handlers::load_settings;
use shopwright_cli::{CliConfig, CliError, CliResult, Reporter, RunArgs, TagExpr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::info;

// ===== Run context =====

/// State outliving single scenarios: suite, session flags, tally
#[derive(Debug)]
pub struct RunContext {
    suite: SuiteState,
    session: Mutex<SessionState>,
    summary: Mutex<SuiteSummary>,
}

impl RunContext {
    /// Context over a prepared suite
    #[must_use]
    pub fn new(suite: SuiteState) -> Self {
        Self {
            suite,
            session: Mutex::new(SessionState::default()),
            summary: Mutex::new(SuiteSummary::default()),
        }
    }

    /// Suite state
    #[must_use]
    pub const fn suite(&self) -> &SuiteState {
        &self.suite
    }

    /// Session flags as left by the last scenario
    #[must_use]
    pub fn session(&self) -> SessionState {
        self.session.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Keep `session` for the next scenario
    pub fn store_session(&self, session: &SessionState) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session.clone();
    }

    /// Count a finished scenario
    pub fn record(&self, trace: &TraceHandle) {
        let trace = trace.lock().unwrap_or_else(PoisonError::into_inner);
        self.summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&trace);
    }

    /// Tally so far
    #[must_use]
    pub fn summary(&self) -> SuiteSummary {
        self.summary.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

// ===== Filtering =====

/// Which scenarios run
#[derive(Debug, Clone, Default)]
pub struct ScenarioFilter {
    tags: Option<TagExpr>,
    name: Option<Regex>,
}

impl ScenarioFilter {
    /// Filter from the command line, falling back to `default_tags`
    pub fn from_args(args: &RunArgs, default_tags: &[String]) -> CliResult<Self> {
        let tags = match args.tags.as_deref() {
            Some(expr) => Some(TagExpr::parse(expr)?),
            None => TagExpr::any_of(default_tags),
        };
        let name = args
            .name
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| CliError::invalid_argument(format!("invalid --name regex: {e}")))?;
        Ok(Self { tags, name })
    }

    /// Whether a scenario with these effective tags and this name runs
    #[must_use]
    pub fn accepts(&self, tags: &[String], name: &str) -> bool {
        self.tags.as_ref().map_or(true, |expr| expr.matches(tags))
            && self.name.as_ref().map_or(true, |re| re.is_match(name))
    }

    /// Tag expression in effect
    #[must_use]
    pub const fn tags(&self) -> Option<&TagExpr> {
        self.tags.as_ref()
    }
}

/// Feature, rule and scenario tags, in that order
#[must_use]
pub fn effective_tags(feature: &gherkin::Feature, rule: Option<&gherkin::Rule>, scenario: &gherkin::Scenario) -> Vec<String> {
    feature
        .tags
        .iter()
        .chain(rule.map(|r| r.tags.iter()).into_iter().flatten())
        .chain(scenario.tags.iter())
        .cloned()
        .collect()
}

fn scenario_info(feature: &gherkin::Feature, rule: Option<&gherkin::Rule>, scenario: &gherkin::Scenario) -> ScenarioInfo {
    let path = feature
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(shopwright::lifecycle::UNKNOWN_FEATURE));
    ScenarioInfo::new(scenario.name.clone(), &path, effective_tags(feature, rule, scenario))
}

// ===== Run =====

/// Run the features under `args.features` (or `run.features`) against the device
pub async fn run(config: &CliConfig, settings_path: Option<&Path>, args: &RunArgs) -> CliResult<()> {
    let settings = load_settings(settings_path)?;
    let features = args.features.clone().unwrap_or_else(|| settings.run.features.clone());
    if !features.exists() {
        return Err(CliError::invalid_argument(format!(
            "feature path {} does not exist",
            features.display()
        )));
    }
    let filter = ScenarioFilter::from_args(args, &settings.run.default_tags)?;

    let reporter = Reporter::from_config(config);
    reporter.header("Scenarios");
    reporter.info(&format!("Features: {}", features.display()));
    if let Some(tags) = filter.tags() {
        reporter.info(&format!("Tags: {tags}"));
    }
    reporter.detail(&format!("Appium: {} ({})", settings.appium.url, settings.appium.platform));
    if let Some(name) = args.name.as_deref() {
        reporter.detail(&format!("Scenario name filter: {name}"));
    }
    info!(features = %features.display(), platform = %settings.appium.platform, "starting run");

    let factory = Arc::new(AppiumFactory::new(settings.appium.clone()));
    let ctx = Arc::new(RunContext::new(SuiteState::new(settings, factory)?));
    let started = Instant::now();
    let failed = execute(Arc::clone(&ctx), features, filter, args.fail_fast).await;

    let summary = ctx.summary();
    reporter.summary(&summary, started.elapsed());
    ctx.suite().drivers().quit().await;
    if failed || summary.failed > 0 {
        return Err(CliError::test_execution(format!(
            "{} of {} scenarios failed",
            summary.failed,
            summary.total()
        )));
    }
    Ok(())
}

/// Drive cucumber over `features`; true when any step failed
async fn execute(ctx: Arc<RunContext>, features: PathBuf, filter: ScenarioFilter, fail_fast: bool) -> bool {
    let before_ctx = Arc::clone(&ctx);
    let cucumber = ShopWorld::cucumber()
        .max_concurrent_scenarios(1)
        .with_cli(cli::Opts::<_, _, _, cli::Empty>::default())
        .before(move |feature, rule, scenario, world| {
            let ctx = Arc::clone(&before_ctx);
            let info = scenario_info(feature, rule, scenario);
            Box::pin(async move { world.begin(ctx, info).await })
        })
        .after(|_feature, _rule, _scenario, finished, world| {
            let failed = matches!(
                finished,
                event::ScenarioFinished::StepFailed(..) | event::ScenarioFinished::BeforeHookFailed(..)
            );
            Box::pin(async move {
                if let Some(world) = world {
                    world.end(failed).await;
                }
            })
        });
    let cucumber = if fail_fast { cucumber.fail_fast() } else { cucumber };
    let writer = cucumber
        .filter_run(features, move |feature, rule, scenario| {
            filter.accepts(&effective_tags(feature, rule, scenario), &scenario.name)
        })
        .await;
    writer.execution_has_failed()
}
