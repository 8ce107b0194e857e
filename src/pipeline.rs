use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument};

use crate::decompose::AddressDecomposer;
use crate::error::{ConvertError, Result};
use crate::records::{PostalAddress, RawClubRecord, SportsOrganization};
use crate::resolver::CountySource;

/// One converted club, tagged with its register position so the output file
/// can list clubs in input order no matter how the row tasks interleave.
#[derive(Debug)]
struct ProcessedClub {
    index: usize,
    organization: SportsOrganization,
    county_resolved: bool,
}

/// Result of a complete conversion run.
#[derive(Debug, Serialize)]
pub struct ConversionSummary {
    pub total_clubs: usize,
    pub with_region: usize,
    pub resolver_hits: usize,
    pub output_file: String,
}

/// Streams register rows, fans each one out to a bounded pool of row tasks
/// and writes the collected output in one piece. Any row failure aborts the
/// run before the output file is touched.
pub struct Pipeline {
    decomposer: Arc<AddressDecomposer>,
    counties: Arc<dyn CountySource>,
    max_in_flight: usize,
}

impl Pipeline {
    pub fn new(
        decomposer: AddressDecomposer,
        counties: Arc<dyn CountySource>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            decomposer: Arc::new(decomposer),
            counties,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Convert a single register row. Infallible by construction: the name
    /// was validated before the task was spawned, and county enrichment
    /// degrades to `None` rather than erroring.
    async fn process_record(
        decomposer: Arc<AddressDecomposer>,
        counties: Arc<dyn CountySource>,
        index: usize,
        record: RawClubRecord,
    ) -> ProcessedClub {
        let name = record.organisation_name.trim().to_string();
        let resolved = counties
            .admin_county(record.postcode.as_deref().unwrap_or(""))
            .await;
        let county_resolved = resolved.is_some();

        let lines = record.address_lines();
        let parts = decomposer.decompose(&name, &lines, resolved.as_deref());
        let address = PostalAddress::new(parts, record.postcode.as_deref());
        let organization = SportsOrganization::new(&name, address);

        ProcessedClub {
            index,
            organization,
            county_resolved,
        }
    }

    #[instrument(skip(self), fields(input = %input.display()))]
    pub async fn run(&self, input: &Path, output: &Path) -> Result<ConversionSummary> {
        info!("🚀 Starting conversion of {}", input.display());
        println!("🚀 Converting {}", input.display());

        let mut reader = csv::Reader::from_path(input)?;
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks: JoinSet<ProcessedClub> = JoinSet::new();
        let mut total_rows = 0usize;

        for (index, row) in reader.deserialize::<RawClubRecord>().enumerate() {
            let record: RawClubRecord = row?;
            if record.organisation_name.trim().is_empty() {
                return Err(ConvertError::Row {
                    row: index + 1,
                    message: "missing organisation name".to_string(),
                });
            }
            total_rows += 1;

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore closed");
            let decomposer = Arc::clone(&self.decomposer);
            let counties = Arc::clone(&self.counties);
            tasks.spawn(async move {
                let processed = Self::process_record(decomposer, counties, index, record).await;
                drop(permit);
                processed
            });
        }

        info!("📡 Read {} rows from the register", total_rows);
        println!("📡 Read {} rows from the register", total_rows);

        let mut clubs = Vec::with_capacity(total_rows);
        while let Some(joined) = tasks.join_next().await {
            // A panicked row task fails the whole run; dropping the set on
            // the error path aborts the stragglers.
            clubs.push(joined?);
            if clubs.len() % 250 == 0 {
                info!("Converted {}/{} clubs", clubs.len(), total_rows);
                println!("   Converted {}/{} clubs", clubs.len(), total_rows);
            }
        }

        clubs.sort_by_key(|club| club.index);
        let resolver_hits = clubs.iter().filter(|club| club.county_resolved).count();
        let organizations: Vec<SportsOrganization> =
            clubs.into_iter().map(|club| club.organization).collect();
        let with_region = organizations
            .iter()
            .filter(|org| org.address.address_region.is_some())
            .count();

        info!(
            "✅ Converted {} clubs ({} with a region, {} from postcode lookups)",
            organizations.len(),
            with_region,
            resolver_hits
        );
        println!(
            "✅ Converted {} clubs ({} with a region, {} from postcode lookups)",
            organizations.len(),
            with_region,
            resolver_hits
        );

        let output_file = Self::persist_to_json(&organizations, output)?;
        info!("💾 Saved clubs to {}", output_file);
        println!("💾 Saved clubs to {}", output_file);

        Ok(ConversionSummary {
            total_clubs: organizations.len(),
            with_region,
            resolver_hits,
            output_file,
        })
    }

    /// Serializes the whole collection once and writes it in one go, so a
    /// failed run never leaves a partial file behind.
    fn persist_to_json(organizations: &[SportsOrganization], output: &Path) -> Result<String> {
        if let Some(dir) = output.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let json_content = serde_json::to_string_pretty(organizations)?;
        fs::write(output, json_content)?;

        Ok(output.to_string_lossy().to_string())
    }
}
