//! Digital product passports and their three lifecycle phases.
//!
//! A passport accretes data in phases: procurement at creation,
//! installation on site, enrichment with compliance documents. Each
//! phase is an optional sub-document; presence of a phase is simply
//! `Some`, so out-of-order writes stay representable. Actor identity
//! and timestamps inside a phase are stamped by the server, never
//! taken from the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::random_suffix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MaterialCategory {
    Cement,
    Steel,
    Bricks,
    Sand,
    Aggregate,
    Glass,
    Tiles,
    Paint,
    Electrical,
    Plumbing,
    #[serde(rename = "HVAC")]
    Hvac,
    Doors,
    Windows,
    Roofing,
    Insulation,
    Flooring,
    Hardware,
    Other,
}

impl MaterialCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialCategory::Cement => "Cement",
            MaterialCategory::Steel => "Steel",
            MaterialCategory::Bricks => "Bricks",
            MaterialCategory::Sand => "Sand",
            MaterialCategory::Aggregate => "Aggregate",
            MaterialCategory::Glass => "Glass",
            MaterialCategory::Tiles => "Tiles",
            MaterialCategory::Paint => "Paint",
            MaterialCategory::Electrical => "Electrical",
            MaterialCategory::Plumbing => "Plumbing",
            MaterialCategory::Hvac => "HVAC",
            MaterialCategory::Doors => "Doors",
            MaterialCategory::Windows => "Windows",
            MaterialCategory::Roofing => "Roofing",
            MaterialCategory::Insulation => "Insulation",
            MaterialCategory::Flooring => "Flooring",
            MaterialCategory::Hardware => "Hardware",
            MaterialCategory::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<MaterialCategory> {
        match s {
            "Cement" => Some(MaterialCategory::Cement),
            "Steel" => Some(MaterialCategory::Steel),
            "Bricks" => Some(MaterialCategory::Bricks),
            "Sand" => Some(MaterialCategory::Sand),
            "Aggregate" => Some(MaterialCategory::Aggregate),
            "Glass" => Some(MaterialCategory::Glass),
            "Tiles" => Some(MaterialCategory::Tiles),
            "Paint" => Some(MaterialCategory::Paint),
            "Electrical" => Some(MaterialCategory::Electrical),
            "Plumbing" => Some(MaterialCategory::Plumbing),
            "HVAC" => Some(MaterialCategory::Hvac),
            "Doors" => Some(MaterialCategory::Doors),
            "Windows" => Some(MaterialCategory::Windows),
            "Roofing" => Some(MaterialCategory::Roofing),
            "Insulation" => Some(MaterialCategory::Insulation),
            "Flooring" => Some(MaterialCategory::Flooring),
            "Hardware" => Some(MaterialCategory::Hardware),
            "Other" => Some(MaterialCategory::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityUnit {
    Kg,
    Ton,
    Piece,
    Box,
    Bag,
    Sqft,
    Sqm,
    Meter,
    Liter,
    Other,
}

impl QuantityUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityUnit::Kg => "kg",
            QuantityUnit::Ton => "ton",
            QuantityUnit::Piece => "piece",
            QuantityUnit::Box => "box",
            QuantityUnit::Bag => "bag",
            QuantityUnit::Sqft => "sqft",
            QuantityUnit::Sqm => "sqm",
            QuantityUnit::Meter => "meter",
            QuantityUnit::Liter => "liter",
            QuantityUnit::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<QuantityUnit> {
        match s {
            "kg" => Some(QuantityUnit::Kg),
            "ton" => Some(QuantityUnit::Ton),
            "piece" => Some(QuantityUnit::Piece),
            "box" => Some(QuantityUnit::Box),
            "bag" => Some(QuantityUnit::Bag),
            "sqft" => Some(QuantityUnit::Sqft),
            "sqm" => Some(QuantityUnit::Sqm),
            "meter" => Some(QuantityUnit::Meter),
            "liter" => Some(QuantityUnit::Liter),
            "other" => Some(QuantityUnit::Other),
            _ => None,
        }
    }
}

/// Lifecycle status. `verified` and `inactive` are representable for
/// forward compatibility but no current operation assigns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DppStatus {
    Created,
    Installed,
    Enriched,
    Verified,
    Inactive,
}

impl DppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DppStatus::Created => "created",
            DppStatus::Installed => "installed",
            DppStatus::Enriched => "enriched",
            DppStatus::Verified => "verified",
            DppStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<DppStatus> {
        match s {
            "created" => Some(DppStatus::Created),
            "installed" => Some(DppStatus::Installed),
            "enriched" => Some(DppStatus::Enriched),
            "verified" => Some(DppStatus::Verified),
            "inactive" => Some(DppStatus::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementData {
    pub supplier_name: Option<String>,
    pub supplier_address: Option<String>,
    pub batch_number: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub delivery_location: Option<String>,
    #[serde(rename = "deliveryPhotoIPFS")]
    pub delivery_photo_ipfs: Option<String>,
    pub notes: Option<String>,
    /// Stamped from the session, never from the request body.
    pub contractor_wallet_address: Option<String>,
    pub procurement_timestamp: Option<DateTime<Utc>>,
    pub procurement_blockchain_tx_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationData {
    pub installation_location: Option<String>,
    pub installation_date: Option<DateTime<Utc>>,
    pub installer_name: Option<String>,
    pub equipment_used: Option<String>,
    #[serde(rename = "commissioningDocsIPFS", default)]
    pub commissioning_docs_ipfs: Vec<String>,
    #[serde(rename = "safetyCertificatesIPFS", default)]
    pub safety_certificates_ipfs: Vec<String>,
    #[serde(rename = "installationPhotosIPFS", default)]
    pub installation_photos_ipfs: Vec<String>,
    pub notes: Option<String>,
    /// Stamped from the session, never from the request body.
    pub installer_wallet_address: Option<String>,
    pub installation_timestamp: Option<DateTime<Utc>>,
    pub installation_blockchain_tx_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentData {
    #[serde(rename = "epdDocumentIPFS")]
    pub epd_document_ipfs: Option<String>,
    #[serde(rename = "fireRatingCertIPFS")]
    pub fire_rating_cert_ipfs: Option<String>,
    #[serde(rename = "technicalSpecsIPFS")]
    pub technical_specs_ipfs: Option<String>,
    #[serde(rename = "warrantyDocIPFS")]
    pub warranty_doc_ipfs: Option<String>,
    #[serde(rename = "maintenanceManualIPFS")]
    pub maintenance_manual_ipfs: Option<String>,
    pub notes: Option<String>,
    /// Stamped from the session, never from the request body.
    pub supplier_wallet_address: Option<String>,
    pub enrichment_timestamp: Option<DateTime<Utc>>,
    pub enrichment_blockchain_tx_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DppMetadata {
    pub manufacturer: Option<String>,
    pub model_number: Option<String>,
    pub serial_number: Option<String>,
    pub batch_number: Option<String>,
    pub production_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub certifications: Vec<String>,
}

/// One public scan of a passport's QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationEvent {
    pub verified_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalProductPassport {
    pub dpp_id: String,
    pub project_id: String,
    pub product_name: String,
    pub category: MaterialCategory,
    pub quantity: f64,
    pub unit: QuantityUnit,
    pub status: DppStatus,
    pub procurement_data: Option<ProcurementData>,
    pub installation_data: Option<InstallationData>,
    pub enrichment_data: Option<EnrichmentData>,
    pub metadata: Option<DppMetadata>,
    pub tags: Vec<String>,
    /// Percentage of the fifteen completeness checks that pass.
    pub document_completeness: u8,
    /// True only once the enrichment phase has been recorded.
    pub compliance_status: bool,
    pub verification_history: Vec<VerificationEvent>,
    pub search_text: String,
    pub verification_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DigitalProductPassport {
    /// `DPP-<projectId>-<unix millis>-<suffix>`.
    pub fn generate_id(project_id: &str) -> String {
        format!(
            "DPP-{}-{}-{}",
            project_id,
            Utc::now().timestamp_millis(),
            random_suffix()
        )
    }

    /// Rebuild the denormalized search haystack. Called after any write
    /// that can change the product fields or the supplier name.
    pub fn refresh_search_text(&mut self) {
        let supplier = self
            .procurement_data
            .as_ref()
            .and_then(|p| p.supplier_name.as_deref())
            .unwrap_or("");
        self.search_text = format!(
            "{} {} {} {}",
            self.product_name,
            self.category.as_str(),
            self.dpp_id,
            supplier
        )
        .trim_end()
        .to_string();
    }

    /// Assemble the public proof bundle from stored transaction hashes
    /// and content references. No collaborator calls; what was stored
    /// is what is proven.
    pub fn blockchain_proof(&self) -> BlockchainProof {
        let procurement = self.procurement_data.as_ref();
        let installation = self.installation_data.as_ref();
        let enrichment = self.enrichment_data.as_ref();

        BlockchainProof {
            dpp_id: self.dpp_id.clone(),
            transactions: ProofTransactions {
                procurement: procurement.and_then(|p| p.procurement_blockchain_tx_hash.clone()),
                installation: installation
                    .and_then(|i| i.installation_blockchain_tx_hash.clone()),
                enrichment: enrichment.and_then(|e| e.enrichment_blockchain_tx_hash.clone()),
            },
            ipfs_hashes: ProofDocuments {
                delivery_photo: procurement.and_then(|p| p.delivery_photo_ipfs.clone()),
                installation_photos: installation
                    .map(|i| i.installation_photos_ipfs.clone())
                    .unwrap_or_default(),
                commissioning_docs: installation
                    .map(|i| i.commissioning_docs_ipfs.clone())
                    .unwrap_or_default(),
                safety_certificates: installation
                    .map(|i| i.safety_certificates_ipfs.clone())
                    .unwrap_or_default(),
                epd_document: enrichment.and_then(|e| e.epd_document_ipfs.clone()),
                fire_rating_cert: enrichment.and_then(|e| e.fire_rating_cert_ipfs.clone()),
                technical_specs: enrichment.and_then(|e| e.technical_specs_ipfs.clone()),
                warranty_doc: enrichment.and_then(|e| e.warranty_doc_ipfs.clone()),
                maintenance_manual: enrichment.and_then(|e| e.maintenance_manual_ipfs.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofTransactions {
    pub procurement: Option<String>,
    pub installation: Option<String>,
    pub enrichment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofDocuments {
    pub delivery_photo: Option<String>,
    pub installation_photos: Vec<String>,
    pub commissioning_docs: Vec<String>,
    pub safety_certificates: Vec<String>,
    pub epd_document: Option<String>,
    pub fire_rating_cert: Option<String>,
    pub technical_specs: Option<String>,
    pub warranty_doc: Option<String>,
    pub maintenance_manual: Option<String>,
}

/// Tamper-evidence bundle exposed by the public proof endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainProof {
    pub dpp_id: String,
    pub transactions: ProofTransactions,
    pub ipfs_hashes: ProofDocuments,
}

/// Compact projection used by dashboards and recent-activity lists.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DppSummary {
    pub dpp_id: String,
    pub project_id: String,
    pub product_name: String,
    pub category: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_dpp() -> DigitalProductPassport {
        DigitalProductPassport {
            dpp_id: "DPP-PRJ-1-TEST-1-AAAA".into(),
            project_id: "PRJ-1-TEST".into(),
            product_name: "Steel Beam".into(),
            category: MaterialCategory::Steel,
            quantity: 10.0,
            unit: QuantityUnit::Ton,
            status: DppStatus::Created,
            procurement_data: None,
            installation_data: None,
            enrichment_data: None,
            metadata: None,
            tags: vec![],
            document_completeness: 0,
            compliance_status: false,
            verification_history: vec![],
            search_text: String::new(),
            verification_url: "http://localhost:5173/verify/DPP-PRJ-1-TEST-1-AAAA".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn generated_ids_embed_the_project() {
        let id = DigitalProductPassport::generate_id("PRJ-17-XYZ1");
        assert!(id.starts_with("DPP-PRJ-17-XYZ1-"));
    }

    #[test]
    fn search_text_includes_supplier_when_present() {
        let mut dpp = bare_dpp();
        dpp.refresh_search_text();
        assert_eq!(dpp.search_text, "Steel Beam Steel DPP-PRJ-1-TEST-1-AAAA");

        dpp.procurement_data = Some(ProcurementData {
            supplier_name: Some("Tata Steel".into()),
            ..Default::default()
        });
        dpp.refresh_search_text();
        assert_eq!(
            dpp.search_text,
            "Steel Beam Steel DPP-PRJ-1-TEST-1-AAAA Tata Steel"
        );
    }

    #[test]
    fn proof_defaults_to_nulls_and_empty_lists() {
        let proof = bare_dpp().blockchain_proof();
        assert!(proof.transactions.procurement.is_none());
        assert!(proof.transactions.enrichment.is_none());
        assert!(proof.ipfs_hashes.installation_photos.is_empty());
        assert!(proof.ipfs_hashes.safety_certificates.is_empty());
        assert!(proof.ipfs_hashes.epd_document.is_none());
    }

    #[test]
    fn proof_copies_stored_hashes() {
        let mut dpp = bare_dpp();
        dpp.procurement_data = Some(ProcurementData {
            delivery_photo_ipfs: Some("bafy-photo".into()),
            procurement_blockchain_tx_hash: Some("0xabc".into()),
            ..Default::default()
        });
        dpp.installation_data = Some(InstallationData {
            installation_photos_ipfs: vec!["bafy-1".into(), "bafy-2".into()],
            safety_certificates_ipfs: vec!["bafy-safety".into()],
            installation_blockchain_tx_hash: Some("0xdef".into()),
            ..Default::default()
        });

        let proof = dpp.blockchain_proof();
        assert_eq!(proof.transactions.procurement.as_deref(), Some("0xabc"));
        assert_eq!(proof.transactions.installation.as_deref(), Some("0xdef"));
        assert_eq!(proof.ipfs_hashes.delivery_photo.as_deref(), Some("bafy-photo"));
        assert_eq!(proof.ipfs_hashes.installation_photos.len(), 2);
        assert_eq!(proof.ipfs_hashes.safety_certificates, vec!["bafy-safety"]);
    }

    #[test]
    fn ipfs_field_names_keep_their_suffix_on_the_wire() {
        let mut dpp = bare_dpp();
        dpp.enrichment_data = Some(EnrichmentData {
            epd_document_ipfs: Some("bafy-epd".into()),
            ..Default::default()
        });
        let json = serde_json::to_value(&dpp).unwrap();
        assert_eq!(
            json["enrichmentData"]["epdDocumentIPFS"],
            serde_json::json!("bafy-epd")
        );
        assert_eq!(json["unit"], serde_json::json!("ton"));
    }
}
