//! The demo run: connect, create two orders, disconnect.

use std::sync::Arc;

use anyhow::Context;
use ledgerbus_consumer::{ClientInitiator, ConsoleSink, Severity};
use ledgerbus_events::{ApplicationExit, MessageService};
use ledgerbus_sales::{CreatedOrder, DespatchDetails, OrderWorkflow};

use crate::config::AppConfig;

pub struct Harness {
    config: AppConfig,
    service: Arc<MessageService>,
    console: Arc<dyn ConsoleSink>,
}

impl Harness {
    pub fn new(
        config: AppConfig,
        service: Arc<MessageService>,
        console: Arc<dyn ConsoleSink>,
    ) -> Self {
        Self {
            config,
            service,
            console,
        }
    }

    /// Run both order scenarios, then fire `exit`.
    ///
    /// Returns the orders created, in creation order.
    pub fn run(&self, exit: &ApplicationExit) -> anyhow::Result<Vec<CreatedOrder>> {
        let company = &self.config.company_name;

        self.console.write(
            Severity::Info,
            &format!("Attempting to connect to company '{company}'."),
        );
        let _initiator = ClientInitiator::new(self.service.clone(), exit, self.console.clone())
            .context("starting client initiator")?;
        self.console
            .write(Severity::Success, &format!("Connected to '{company}'."));

        let workflow = OrderWorkflow::new(self.service.clone())?;
        let mut created = Vec::with_capacity(2);

        self.console.write(Severity::General, "Creating Sales Order...");
        created.push(self.posted(workflow.create_sales_order(&self.config.customer)?));

        self.console
            .write(Severity::General, "Creating Sales Order (Advanced)...");
        let details = DespatchDetails::courier("DHL", "Special Delivery Instructions")
            .with_project("J00000001", "Revenue");
        created.push(self.posted(
            workflow.create_sales_order_advanced(&self.config.customer, details)?,
        ));

        self.console.write(
            Severity::General,
            &format!("Disconnecting from '{company}'."),
        );
        exit.fire();
        self.console
            .write(Severity::General, &format!("Disconnected from '{company}'."));
        self.console.write(Severity::General, "Shutting Down.");

        Ok(created)
    }

    fn posted(&self, created: CreatedOrder) -> CreatedOrder {
        for failure in created.created.failures() {
            self.console.write(
                Severity::Warning,
                &format!("Handler '{}' failed: {}", failure.handler, failure.reason),
            );
        }
        let responses: Vec<_> = created
            .created
            .args()
            .iter()
            .map(|r| r.properties().to_json())
            .collect();
        tracing::info!(
            document_no = %created.order.document_no(),
            responses = ?responses,
            "order created"
        );

        self.console.write(
            Severity::Success,
            &format!(
                "Sales Order '{}' posted successfully.",
                created.order.document_no()
            ),
        );
        created
    }
}
