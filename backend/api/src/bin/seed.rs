//! Development seeder. Wipes the database and loads a demo dataset:
//! one user per role, one project with all three field roles on it,
//! and three passports at the created, installed, and enriched stages.

use chrono::{Duration, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dpp_api::api::verification_url;
use dpp_api::config::Config;
use dpp_api::db;
use dpp_api::models::{
    Budget, Coordinates, DigitalProductPassport, DppMetadata, DppStatus, EnrichmentData,
    InstallationData, Location, MaterialCategory, ProcurementData, Project, ProjectStatus,
    ProjectType, QuantityUnit, Role, Timeline, User,
};
use dpp_api::scoring;

const OWNER: &str = "0x1111111111111111111111111111111111111111";
const CONTRACTOR: &str = "0x2222222222222222222222222222222222222222";
const INSTALLER: &str = "0x3333333333333333333333333333333333333333";
const SUPPLIER: &str = "0x4444444444444444444444444444444444444444";
const REGULATOR: &str = "0x5555555555555555555555555555555555555555";

fn demo_user(wallet: &str, role: Role, name: &str, company: &str, email: &str) -> User {
    let now = Utc::now();
    User {
        wallet_address: wallet.to_string(),
        role,
        name: name.to_string(),
        company: Some(company.to_string()),
        email: Some(email.to_string()),
        phone_number: None,
        profile_image: None,
        is_active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    // Wipe in FK dependency order.
    for table in [
        "sessions",
        "dpps",
        "project_members",
        "user_projects",
        "projects",
        "users",
    ] {
        sqlx::query(&format!("DELETE FROM {table}")).execute(&pool).await?;
    }

    let users = [
        demo_user(OWNER, Role::Owner, "Rajesh Kumar", "Skyline Developers", "rajesh@skyline.example"),
        demo_user(CONTRACTOR, Role::Contractor, "Amit Sharma", "BuildRight Constructions", "amit@buildright.example"),
        demo_user(INSTALLER, Role::Installer, "Suresh Patel", "Precision Install Services", "suresh@precision.example"),
        demo_user(SUPPLIER, Role::Supplier, "Meera Iyer", "UltraTech Building Products", "meera@ultratech.example"),
        demo_user(REGULATOR, Role::Regulator, "Priya Singh", "Pune Municipal Corporation", "priya@pmc.example"),
    ];
    for user in &users {
        db::users::insert(&pool, user).await?;
    }
    info!("seeded {} users", users.len());

    let now = Utc::now();
    let project_id = Project::generate_id();
    let project = Project {
        project_id: project_id.clone(),
        project_name: "Skyline Towers Phase 1".into(),
        description: Some("Twin-tower residential development with retail podium".into()),
        owner_wallet_address: OWNER.into(),
        project_type: ProjectType::Residential,
        status: ProjectStatus::Active,
        location: Some(Location {
            address: Some("Survey 42, Baner Road".into()),
            city: Some("Pune".into()),
            state: Some("Maharashtra".into()),
            country: Some("India".into()),
            pincode: Some("411045".into()),
            coordinates: Some(Coordinates {
                latitude: Some(18.5596),
                longitude: Some(73.7897),
            }),
        }),
        total_floors: Some(24),
        zones: vec!["Tower A".into(), "Tower B".into(), "Podium".into()],
        authorized_contractors: vec![],
        authorized_installers: vec![],
        authorized_suppliers: vec![],
        timeline: Some(Timeline {
            start_date: Some(now - Duration::days(120)),
            expected_completion: Some(now + Duration::days(600)),
            actual_completion: None,
        }),
        budget: Some(Budget {
            estimated: Some(850_000_000.0),
            actual: None,
            currency: Some("INR".into()),
        }),
        ipfs_hash: None,
        blockchain_tx_hash: None,
        verification_url: verification_url(&config.frontend_url, &project_id),
        created_at: now,
        updated_at: now,
    };
    db::projects::insert(&pool, &project).await?;
    db::users::assign_project(&pool, OWNER, &project_id).await?;

    for (role, wallet) in [
        (Role::Contractor, CONTRACTOR),
        (Role::Installer, INSTALLER),
        (Role::Supplier, SUPPLIER),
    ] {
        db::projects::add_member(&pool, &project_id, role, wallet, now).await?;
        db::users::assign_project(&pool, wallet, &project_id).await?;
    }
    info!("seeded project {project_id}");

    // Passport 1: freshly procured cement, nothing installed yet.
    let mut cement = DigitalProductPassport {
        dpp_id: DigitalProductPassport::generate_id(&project_id),
        project_id: project_id.clone(),
        product_name: "OPC 53 Grade Cement".into(),
        category: MaterialCategory::Cement,
        quantity: 500.0,
        unit: QuantityUnit::Bag,
        status: DppStatus::Created,
        procurement_data: Some(ProcurementData {
            supplier_name: Some("UltraTech Building Products".into()),
            supplier_address: Some("Plot 4, MIDC Bhosari, Pune".into()),
            batch_number: Some("UT-53-20240811".into()),
            delivery_date: Some(now - Duration::days(7)),
            delivery_location: Some("Site stockyard, Gate 3".into()),
            contractor_wallet_address: Some(CONTRACTOR.into()),
            procurement_timestamp: Some(now - Duration::days(7)),
            ..Default::default()
        }),
        installation_data: None,
        enrichment_data: None,
        metadata: Some(DppMetadata {
            manufacturer: Some("UltraTech Cement Ltd".into()),
            batch_number: Some("UT-53-20240811".into()),
            production_date: Some(now - Duration::days(30)),
            expiry_date: Some(now + Duration::days(60)),
            certifications: vec!["IS 12269:2013".into()],
            ..Default::default()
        }),
        tags: vec!["structural".into()],
        document_completeness: 0,
        compliance_status: false,
        verification_history: vec![],
        search_text: String::new(),
        verification_url: String::new(),
        created_at: now - Duration::days(7),
        updated_at: now - Duration::days(7),
    };
    cement.verification_url = verification_url(&config.frontend_url, &cement.dpp_id);
    cement.document_completeness = scoring::completeness_score(&cement);
    cement.refresh_search_text();
    db::dpps::insert(&pool, &cement).await?;

    // Passport 2: steel that has been installed.
    let mut steel = DigitalProductPassport {
        dpp_id: DigitalProductPassport::generate_id(&project_id),
        project_id: project_id.clone(),
        product_name: "TMT Steel Bars Fe500D".into(),
        category: MaterialCategory::Steel,
        quantity: 25.0,
        unit: QuantityUnit::Ton,
        status: DppStatus::Installed,
        procurement_data: Some(ProcurementData {
            supplier_name: Some("Tata Steel".into()),
            supplier_address: Some("Jamshedpur Works, Jharkhand".into()),
            batch_number: Some("TS-FE500D-1184".into()),
            delivery_date: Some(now - Duration::days(21)),
            delivery_location: Some("Rebar yard, Gate 1".into()),
            delivery_photo_ipfs: Some("bafybeialpha000000000000000000000000000steel1".into()),
            contractor_wallet_address: Some(CONTRACTOR.into()),
            procurement_timestamp: Some(now - Duration::days(21)),
            ..Default::default()
        }),
        installation_data: Some(InstallationData {
            installation_location: Some("Tower A, columns, floors 1 to 4".into()),
            installation_date: Some(now - Duration::days(5)),
            installer_name: Some("Precision Install Services".into()),
            equipment_used: Some("Tower crane TC-2, bar bending station".into()),
            installation_photos_ipfs: vec![
                "bafybeialpha000000000000000000000000000steel2".into(),
            ],
            installer_wallet_address: Some(INSTALLER.into()),
            installation_timestamp: Some(now - Duration::days(5)),
            ..Default::default()
        }),
        enrichment_data: None,
        metadata: Some(DppMetadata {
            manufacturer: Some("Tata Steel Ltd".into()),
            model_number: Some("Fe500D".into()),
            batch_number: Some("TS-FE500D-1184".into()),
            production_date: Some(now - Duration::days(60)),
            certifications: vec!["IS 1786:2008".into()],
            ..Default::default()
        }),
        tags: vec!["structural".into(), "rebar".into()],
        document_completeness: 0,
        compliance_status: false,
        verification_history: vec![],
        search_text: String::new(),
        verification_url: String::new(),
        created_at: now - Duration::days(21),
        updated_at: now - Duration::days(5),
    };
    steel.verification_url = verification_url(&config.frontend_url, &steel.dpp_id);
    steel.document_completeness = scoring::completeness_score(&steel);
    steel.refresh_search_text();
    db::dpps::insert(&pool, &steel).await?;

    // Passport 3: HVAC unit through the whole chain, compliant.
    let mut hvac = DigitalProductPassport {
        dpp_id: DigitalProductPassport::generate_id(&project_id),
        project_id: project_id.clone(),
        product_name: "VRF Outdoor Unit 20HP".into(),
        category: MaterialCategory::Hvac,
        quantity: 2.0,
        unit: QuantityUnit::Piece,
        status: DppStatus::Enriched,
        procurement_data: Some(ProcurementData {
            supplier_name: Some("Daikin India".into()),
            supplier_address: Some("Neemrana, Rajasthan".into()),
            batch_number: Some("DK-VRF-20HP-77".into()),
            delivery_date: Some(now - Duration::days(40)),
            delivery_location: Some("Tower B service lift lobby".into()),
            delivery_photo_ipfs: Some("bafybeialpha0000000000000000000000000000hvac1".into()),
            contractor_wallet_address: Some(CONTRACTOR.into()),
            procurement_timestamp: Some(now - Duration::days(40)),
            ..Default::default()
        }),
        installation_data: Some(InstallationData {
            installation_location: Some("Tower B rooftop plant room".into()),
            installation_date: Some(now - Duration::days(14)),
            installer_name: Some("Precision Install Services".into()),
            equipment_used: Some("Mobile crane 50T, vacuum pump".into()),
            installation_photos_ipfs: vec![
                "bafybeialpha0000000000000000000000000000hvac2".into(),
            ],
            commissioning_docs_ipfs: vec![
                "bafybeialpha0000000000000000000000000000hvac3".into(),
            ],
            safety_certificates_ipfs: vec![
                "bafybeialpha0000000000000000000000000000hvac4".into(),
            ],
            installer_wallet_address: Some(INSTALLER.into()),
            installation_timestamp: Some(now - Duration::days(14)),
            ..Default::default()
        }),
        enrichment_data: Some(EnrichmentData {
            epd_document_ipfs: Some("bafybeialpha0000000000000000000000000000hvac5".into()),
            fire_rating_cert_ipfs: None,
            technical_specs_ipfs: Some("bafybeialpha0000000000000000000000000000hvac6".into()),
            warranty_doc_ipfs: Some("bafybeialpha0000000000000000000000000000hvac7".into()),
            maintenance_manual_ipfs: Some(
                "bafybeialpha0000000000000000000000000000hvac8".into(),
            ),
            notes: Some("Commissioned and load tested at 100% duty".into()),
            supplier_wallet_address: Some(SUPPLIER.into()),
            enrichment_timestamp: Some(now - Duration::days(2)),
            ..Default::default()
        }),
        metadata: Some(DppMetadata {
            manufacturer: Some("Daikin".into()),
            model_number: Some("RXUQ20A".into()),
            serial_number: Some("DKIN-2024-08851".into()),
            production_date: Some(now - Duration::days(90)),
            certifications: vec!["AHRI 1230".into(), "ISO 5151".into()],
            ..Default::default()
        }),
        tags: vec!["hvac".into(), "mep".into()],
        document_completeness: 0,
        compliance_status: true,
        verification_history: vec![],
        search_text: String::new(),
        verification_url: String::new(),
        created_at: now - Duration::days(40),
        updated_at: now - Duration::days(2),
    };
    hvac.verification_url = verification_url(&config.frontend_url, &hvac.dpp_id);
    hvac.document_completeness = scoring::completeness_score(&hvac);
    hvac.refresh_search_text();
    db::dpps::insert(&pool, &hvac).await?;

    info!("seeded 3 passports (created, installed, enriched)");
    info!("owner wallet:      {OWNER}");
    info!("contractor wallet: {CONTRACTOR}");
    info!("installer wallet:  {INSTALLER}");
    info!("supplier wallet:   {SUPPLIER}");
    info!("regulator wallet:  {REGULATOR}");

    Ok(())
}
