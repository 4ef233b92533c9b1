//! Synthetic people for trying the portal out

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{info, warn};

use crate::context::OperatorIdentity;
use crate::error::{Conflict, RosterError, RosterResult};
use crate::person::{insert_person, ValidPerson};

pub const DEFAULT_SAMPLE_COUNT: usize = 55;

const FIRST_NAMES: &[&str] = &[
    "Raj", "Priya", "Amit", "Sneha", "Vikram", "Anjali", "Rahul", "Kavya", "Suresh", "Divya",
    "Mohit", "Neha", "Ravi", "Pooja", "Karan", "Meera", "Arjun", "Shreya", "Nikhil", "Isha",
    "Dhruv", "Ananya", "Kunal", "Riya", "Varun", "Sanjana", "Yash", "Aditi", "Harsh", "Tanvi",
    "Manish", "Sakshi", "Gaurav", "Aishwarya", "Rohan", "Kritika", "Abhishek", "Swati", "Prateek",
    "Nidhi", "Siddharth", "Juhi", "Vivek", "Mansi", "Akash", "Shivani", "Rishabh", "Pallavi",
    "Sagar", "Deepika",
];

const LAST_NAMES: &[&str] = &[
    "Patel", "Sharma", "Kumar", "Singh", "Gupta", "Verma", "Yadav", "Jain", "Shah", "Mehta",
    "Reddy", "Rao", "Nair", "Iyer", "Menon", "Pillai", "Desai", "Joshi", "Malhotra", "Agarwal",
    "Kapoor", "Chopra", "Bansal", "Goyal", "Arora", "Khanna", "Sethi", "Bhatia", "Tiwari",
    "Mishra",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SampleReport {
    pub inserted: usize,
    /// Serials that already existed
    pub skipped: usize,
    /// Other storage failures
    pub failed: usize,
}

impl SampleReport {
    pub fn message(&self) -> String {
        let mut message = format!("Sample data generated: {} people added.", self.inserted);
        if self.skipped > 0 {
            message.push_str(&format!(" ({} skipped - duplicates)", self.skipped));
        }
        message
    }
}

fn sample_person<R: Rng + ?Sized>(serial: usize, rng: &mut R) -> ValidPerson {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Sample");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Person");

    ValidPerson {
        entry_seq: Some(format!("ENT{:03}", serial)),
        serial_number: serial as i64,
        full_name: format!("{} {}", first, last),
        mobile_number: format!("9{:09}", rng.gen_range(0..1_000_000_000u32)),
    }
}

#[derive(Clone)]
pub struct SampleDataGenerator {
    db: DatabaseConnection,
}

impl SampleDataGenerator {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert people with serials `1..=count`, skipping serials already taken.
    pub async fn generate(
        &self,
        actor: &OperatorIdentity,
        count: usize,
    ) -> RosterResult<SampleReport> {
        let mut rng = StdRng::from_entropy();
        self.generate_with_rng(actor, count, &mut rng).await
    }

    pub async fn generate_with_rng<R: Rng + Send>(
        &self,
        actor: &OperatorIdentity,
        count: usize,
        rng: &mut R,
    ) -> RosterResult<SampleReport> {
        let mut report = SampleReport::default();
        let tx = self.db.begin().await?;

        for serial in 1..=count {
            let candidate = sample_person(serial, rng);

            let savepoint = tx.begin().await?;
            match insert_person(&savepoint, candidate).await {
                Ok(_) => {
                    savepoint.commit().await?;
                    report.inserted += 1;
                }
                Err(RosterError::Conflict(Conflict::DuplicateSerial(_))) => {
                    savepoint.rollback().await?;
                    report.skipped += 1;
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    warn!(serial, error = %e, "Failed to insert sample person");
                    report.failed += 1;
                }
            }
        }

        tx.commit().await?;

        info!(
            operator = %actor.username,
            inserted = report.inserted,
            skipped = report.skipped,
            "Sample data generated"
        );
        Ok(report)
    }
}
