//! Profile screen reached from the account page.

use super::PageObject;
use crate::element::Ui;
use crate::result::ShopResult;
use async_trait::async_trait;
use std::time::Duration;

const PROFILE_BUTTON: &str = "profileButton.accessibility";
const TITLE: &str = "profilePageTitle.text";

/// Profile screen
#[derive(Debug, Clone)]
pub struct ProfilePage {
    ui: Ui,
}

impl ProfilePage {
    /// Page over `ui`
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Tap the profile entry on the account page
    pub async fn click_profile(&self) -> ShopResult<()> {
        let button = self.ui.locator(PROFILE_BUTTON)?;
        self.ui.click_within(&button, Duration::from_secs(10)).await?;
        self.ui.step("Clicked on Profile");
        Ok(())
    }

    /// Title visible now
    pub async fn is_profile_page_displayed(&self) -> bool {
        self.ui.is_displayed_key(TITLE).await
    }

    /// Wait for the title
    pub async fn wait_for_profile_page(&self, timeout: Duration) -> bool {
        let shown = self.ui.is_displayed_key_within(TITLE, timeout).await;
        if !shown {
            self.ui
                .warn_step(format!("Profile page not shown after {} seconds", timeout.as_secs()));
        }
        shown
    }
}

#[async_trait]
impl PageObject for ProfilePage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Profile page"
    }

    async fn is_displayed(&self) -> bool {
        self.is_profile_page_displayed().await
    }
}
