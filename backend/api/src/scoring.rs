//! Document completeness scoring.
//!
//! Fifteen unweighted checks spread across the three lifecycle phases:
//! six procurement fields, four installation checks (photos and
//! commissioning docs count as one combined check), five enrichment
//! documents. The score is the passed fraction as a rounded percentage.
//! A missing phase simply fails all of its checks, so the score is
//! total-lifecycle progress, not progress within the current phase.

use crate::models::DigitalProductPassport;

const TOTAL_CHECKS: u32 = 15;

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
}

/// Percentage (0..=100) of completeness checks the passport passes.
pub fn completeness_score(dpp: &DigitalProductPassport) -> u8 {
    let mut passed = 0u32;

    if let Some(p) = &dpp.procurement_data {
        passed += has_text(&p.supplier_name) as u32;
        passed += has_text(&p.supplier_address) as u32;
        passed += has_text(&p.batch_number) as u32;
        passed += p.delivery_date.is_some() as u32;
        passed += has_text(&p.delivery_location) as u32;
        passed += has_text(&p.delivery_photo_ipfs) as u32;
    }

    if let Some(i) = &dpp.installation_data {
        passed += has_text(&i.installation_location) as u32;
        passed += i.installation_date.is_some() as u32;
        passed += has_text(&i.installer_name) as u32;
        passed += (!i.installation_photos_ipfs.is_empty()
            || !i.commissioning_docs_ipfs.is_empty()) as u32;
    }

    if let Some(e) = &dpp.enrichment_data {
        passed += has_text(&e.epd_document_ipfs) as u32;
        passed += has_text(&e.fire_rating_cert_ipfs) as u32;
        passed += has_text(&e.technical_specs_ipfs) as u32;
        passed += has_text(&e.warranty_doc_ipfs) as u32;
        passed += has_text(&e.maintenance_manual_ipfs) as u32;
    }

    ((passed as f64 / TOTAL_CHECKS as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DppStatus, EnrichmentData, InstallationData, MaterialCategory, ProcurementData,
        QuantityUnit,
    };
    use chrono::Utc;

    fn dpp() -> DigitalProductPassport {
        DigitalProductPassport {
            dpp_id: "DPP-PRJ-1-1-AAAA".into(),
            project_id: "PRJ-1".into(),
            product_name: "Cement Bag".into(),
            category: MaterialCategory::Cement,
            quantity: 50.0,
            unit: QuantityUnit::Bag,
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
            verification_url: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn installation_three_checks() -> InstallationData {
        InstallationData {
            installation_location: Some("Basement B2".into()),
            installation_date: Some(Utc::now()),
            installer_name: Some("R. Sharma".into()),
            ..Default::default()
        }
    }

    fn enrichment_all_five() -> EnrichmentData {
        EnrichmentData {
            epd_document_ipfs: Some("bafy-epd".into()),
            fire_rating_cert_ipfs: Some("bafy-fire".into()),
            technical_specs_ipfs: Some("bafy-specs".into()),
            warranty_doc_ipfs: Some("bafy-warranty".into()),
            maintenance_manual_ipfs: Some("bafy-manual".into()),
            ..Default::default()
        }
    }

    #[test]
    fn no_phase_data_scores_zero() {
        assert_eq!(completeness_score(&dpp()), 0);
    }

    #[test]
    fn empty_phase_objects_score_zero() {
        let mut d = dpp();
        d.procurement_data = Some(ProcurementData::default());
        d.installation_data = Some(InstallationData::default());
        d.enrichment_data = Some(EnrichmentData::default());
        assert_eq!(completeness_score(&d), 0);
    }

    #[test]
    fn empty_strings_do_not_count() {
        let mut d = dpp();
        d.procurement_data = Some(ProcurementData {
            supplier_name: Some(String::new()),
            supplier_address: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(completeness_score(&d), 0);
    }

    #[test]
    fn three_installation_checks_score_twenty() {
        let mut d = dpp();
        d.installation_data = Some(installation_three_checks());
        assert_eq!(completeness_score(&d), 20);
    }

    #[test]
    fn enrichment_on_top_scores_fifty_three() {
        let mut d = dpp();
        d.installation_data = Some(installation_three_checks());
        d.enrichment_data = Some(enrichment_all_five());
        // 8 of 15 checks, rounded from 53.33.
        assert_eq!(completeness_score(&d), 53);
    }

    #[test]
    fn photos_and_commissioning_docs_share_one_check() {
        let mut d = dpp();
        d.installation_data = Some(InstallationData {
            installation_photos_ipfs: vec!["bafy-1".into()],
            ..Default::default()
        });
        let photos_only = completeness_score(&d);

        d.installation_data = Some(InstallationData {
            commissioning_docs_ipfs: vec!["bafy-2".into()],
            ..Default::default()
        });
        let docs_only = completeness_score(&d);

        d.installation_data = Some(InstallationData {
            installation_photos_ipfs: vec!["bafy-1".into()],
            commissioning_docs_ipfs: vec!["bafy-2".into()],
            ..Default::default()
        });
        let both = completeness_score(&d);

        assert_eq!(photos_only, 7); // 1 of 15
        assert_eq!(docs_only, 7);
        assert_eq!(both, 7);
    }

    #[test]
    fn safety_certificates_do_not_move_the_score() {
        let mut d = dpp();
        let mut install = installation_three_checks();
        install.safety_certificates_ipfs = vec!["bafy-safety".into()];
        d.installation_data = Some(install);
        assert_eq!(completeness_score(&d), 20);
    }

    #[test]
    fn all_fifteen_checks_score_one_hundred() {
        let mut d = dpp();
        d.procurement_data = Some(ProcurementData {
            supplier_name: Some("UltraTech".into()),
            supplier_address: Some("Plot 4, MIDC, Pune".into()),
            batch_number: Some("B-2024-091".into()),
            delivery_date: Some(Utc::now()),
            delivery_location: Some("Gate 3".into()),
            delivery_photo_ipfs: Some("bafy-delivery".into()),
            ..Default::default()
        });
        let mut install = installation_three_checks();
        install.installation_photos_ipfs = vec!["bafy-install".into()];
        d.installation_data = Some(install);
        d.enrichment_data = Some(enrichment_all_five());
        assert_eq!(completeness_score(&d), 100);
    }

    #[test]
    fn adding_a_field_never_lowers_the_score() {
        let mut d = dpp();
        d.procurement_data = Some(ProcurementData {
            supplier_name: Some("UltraTech".into()),
            ..Default::default()
        });
        let before = completeness_score(&d);
        d.procurement_data.as_mut().unwrap().batch_number = Some("B-1".into());
        assert!(completeness_score(&d) >= before);
    }
}
