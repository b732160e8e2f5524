//! Cucumber world: one per scenario, backed by the shared run context

use crate::runner::RunContext;
use cucumber::World;
use shopwright::pages::{AccountPage, ActiveOrdersPage, FulfilmentPage, PaymentsPage, PickupLocationPage, ProductsPage};
use shopwright::{
    Navigator, PaymentContext, ScenarioInfo, ScenarioTrace, SessionState, Settings, ShopError, ShopResult,
    TraceHandle, Ui,
};
use std::sync::Arc;

/// Scenario state seen by every step
#[derive(Debug, Default, World)]
pub struct ShopWorld {
    ctx: Option<Arc<RunContext>>,
    scenario: Option<ScenarioInfo>,
    trace: Option<TraceHandle>,
    ui: Option<Ui>,
    setup_error: Option<String>,
    /// Session flags, copied from and back to the run context
    pub session: SessionState,
    /// Payment captured at checkout
    pub payment: PaymentContext,
}

impl ShopWorld {
    /// Start `scenario`: trace, session reset or login, helpers.
    /// A setup failure is kept and surfaces on the first step.
    pub async fn begin(&mut self, ctx: Arc<RunContext>, scenario: ScenarioInfo) {
        let trace = ScenarioTrace::start(&scenario.name, &scenario.feature_file, scenario.tags.clone()).shared();
        self.session = ctx.session();
        let prepared = ctx
            .suite()
            .before_scenario(&scenario, &trace, &mut self.session)
            .await;
        ctx.store_session(&self.session);
        match prepared {
            Ok(ui) => self.ui = Some(ui),
            Err(e) => {
                tracing::error!(scenario = %scenario.name, error = %e, "scenario setup failed");
                self.setup_error = Some(e.to_string());
            }
        }
        self.trace = Some(trace);
        self.scenario = Some(scenario);
        self.ctx = Some(ctx);
    }

    /// Finish the scenario: screenshot, trace file, cleanup, tally
    pub async fn end(&mut self, failed: bool) {
        let (Some(ctx), Some(scenario), Some(trace)) = (self.ctx.clone(), self.scenario.take(), self.trace.take())
        else {
            return;
        };
        let failed = failed || self.setup_error.is_some();
        ctx.suite().after_scenario(&scenario, &trace, failed).await;
        ctx.store_session(&self.session);
        ctx.record(&trace);
        self.ui = None;
    }

    /// Helpers over the scenario's driver
    pub fn ui(&self) -> ShopResult<&Ui> {
        if let Some(e) = &self.setup_error {
            return Err(ShopError::state(format!("scenario setup failed: {e}")));
        }
        self.ui
            .as_ref()
            .ok_or_else(|| ShopError::state("no driver session for this scenario"))
    }

    /// Settings of the run
    pub fn settings(&self) -> ShopResult<&Settings> {
        self.ctx
            .as_deref()
            .map(|ctx| ctx.suite().settings())
            .ok_or_else(|| ShopError::state("scenario has not started"))
    }

    /// Build a page that only needs the helpers
    pub fn page<P>(&self, make: impl FnOnce(Ui) -> P) -> ShopResult<P> {
        Ok(make(self.ui()?.clone()))
    }

    /// Multi-page flows with the configured test data
    pub fn nav(&self) -> ShopResult<Navigator> {
        Ok(Navigator::from_settings(self.ui()?.clone(), self.settings()?))
    }

    /// Product page titled from settings
    pub fn products(&self) -> ShopResult<ProductsPage> {
        let title = self.settings()?.product.page_title.clone();
        Ok(ProductsPage::new(self.ui()?.clone(), title))
    }

    /// Pickup picker with the configured location
    pub fn pickup(&self) -> ShopResult<PickupLocationPage> {
        let option = self.settings()?.product.pickup_location.clone();
        Ok(PickupLocationPage::new(self.ui()?.clone()).with_option(option))
    }

    /// Fulfilment page with the configured plate number
    pub fn fulfilment(&self) -> ShopResult<FulfilmentPage> {
        let plate = self.settings()?.payment.plate_number.clone();
        Ok(FulfilmentPage::new(self.ui()?.clone(), plate))
    }

    /// Payments page with the configured payment data
    pub fn payments(&self) -> ShopResult<PaymentsPage> {
        let payment = self.settings()?.payment.clone();
        Ok(PaymentsPage::new(self.ui()?.clone(), payment))
    }

    /// Account page for the configured account
    pub fn account(&self) -> ShopResult<AccountPage> {
        let account = self.settings()?.account.clone();
        Ok(AccountPage::new(self.ui()?.clone(), account))
    }

    /// Active orders with the configured status priority
    pub fn active_orders(&self) -> ShopResult<ActiveOrdersPage> {
        let orders = self.settings()?.orders.clone();
        Ok(ActiveOrdersPage::new(self.ui()?.clone(), orders))
    }

    /// Configured search term
    pub fn search_term(&self) -> ShopResult<String> {
        Ok(self.settings()?.product.search_term.clone())
    }

    /// Configured quantity
    pub fn quantity(&self) -> ShopResult<String> {
        Ok(self.settings()?.product.quantity.clone())
    }
}
