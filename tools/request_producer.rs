//! Test Request Producer
//!
//! Generates random customer records and sends them as prediction requests
//! to the churn service, logging each verdict.

use churn_guard::{Field, PredictionReply, RawRecord};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Customer record generator for testing
struct RecordGenerator {
    rng: rand::rngs::ThreadRng,
    record_counter: u64,
}

impl RecordGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            record_counter: 0,
        }
    }

    /// Generate a random valid record
    fn generate_typical(&mut self) -> RawRecord {
        let tenure = self.rng.gen_range(0..=72);
        let monthly = self.rng.gen_range(18.0..120.0);
        let internet = self.random_option(Field::InternetService);
        self.build(tenure, monthly, internet, |generator, field| {
            generator.random_option(field)
        })
    }

    /// Generate a record with the classic churn profile: new customer,
    /// monthly contract, fiber, electronic check
    fn generate_high_risk(&mut self) -> RawRecord {
        let tenure = self.rng.gen_range(1..=6);
        let monthly = self.rng.gen_range(80.0..110.0);
        self.build(tenure, monthly, "Fiber optic", |generator, field| match field {
            Field::Contract => "Month-to-month",
            Field::PaymentMethod => "Electronic check",
            Field::PaperlessBilling => "Yes",
            Field::OnlineSecurity | Field::TechSupport => "No",
            _ => generator.random_option(field),
        })
    }

    fn build(
        &mut self,
        tenure: i32,
        monthly: f64,
        internet: &'static str,
        mut pick: impl FnMut(&mut Self, Field) -> &'static str,
    ) -> RawRecord {
        self.record_counter += 1;

        let phone = pick(self, Field::PhoneService);
        let mut record = RawRecord::new()
            .with(Field::SeniorCitizen, i32::from(self.rng.gen_bool(0.16)))
            .with(Field::Tenure, tenure)
            .with(Field::MonthlyCharges, (monthly * 100.0_f64).round() / 100.0)
            .with(Field::TotalCharges, ((monthly * f64::from(tenure.max(1))) * 100.0).round() / 100.0)
            .with(Field::PhoneService, phone)
            .with(Field::InternetService, internet);

        for field in Field::ALL {
            if !field.is_categorical() || record.get(field).is_some() {
                continue;
            }
            let value = match field {
                Field::MultipleLines if phone == "No" => "No phone service",
                Field::MultipleLines => self.yes_no(),
                Field::OnlineSecurity
                | Field::OnlineBackup
                | Field::DeviceProtection
                | Field::TechSupport
                | Field::StreamingTV
                | Field::StreamingMovies
                    if internet == "No" =>
                {
                    "No internet service"
                }
                _ => pick(self, field),
            };
            // Add-ons never claim "no internet" for subscribers
            let value = if value == "No internet service" && internet != "No" {
                "No"
            } else {
                value
            };
            record.set(field, value);
        }

        record
    }

    fn yes_no(&mut self) -> &'static str {
        if self.rng.gen_bool(0.5) {
            "Yes"
        } else {
            "No"
        }
    }

    fn random_option(&mut self, field: Field) -> &'static str {
        let options = field.options();
        options[self.rng.gen_range(0..options.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("request_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Request Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("churn.predict");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let high_risk_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.25);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        high_risk_rate = high_risk_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, high_risk_rate, delay_ms).await;
        }
    };

    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Sending {} prediction requests...", count);

    let mut churn_count = 0;
    let mut stay_count = 0;
    let mut rejected_count = 0;

    for i in 0..count {
        let high_risk = rng.gen_bool(high_risk_rate);
        let record = if high_risk {
            generator.generate_high_risk()
        } else {
            generator.generate_typical()
        };

        let payload = serde_json::to_vec(&record)?;

        match client.request(subject.to_string(), payload.into()).await {
            Ok(message) => match serde_json::from_slice::<PredictionReply>(&message.payload) {
                Ok(reply) => match (&reply.label, &reply.error) {
                    (Some(label), _) => {
                        if label == "Churn" {
                            churn_count += 1;
                        } else {
                            stay_count += 1;
                        }
                        info!(
                            record = i + 1,
                            high_risk = high_risk,
                            verdict = %label,
                            churn_probability = reply.churn_probability.unwrap_or_default(),
                            "Verdict received"
                        );
                    }
                    (None, error) => {
                        rejected_count += 1;
                        warn!(record = i + 1, error = ?error, "Request rejected");
                    }
                },
                Err(e) => warn!(error = %e, "Unreadable reply"),
            },
            Err(e) => warn!(error = %e, "Request failed"),
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} churn, {} no churn, {} rejected)",
        count, churn_count, stay_count, rejected_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, high_risk_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let record = if rng.gen_bool(high_risk_rate) {
            generator.generate_high_risk()
        } else {
            generator.generate_typical()
        };

        let json = serde_json::to_string_pretty(&record)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample record {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!("Generated {} records", generator.record_counter);

    Ok(())
}
