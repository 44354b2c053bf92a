//! Demo reference data for the CLI.

use tokio_util::sync::CancellationToken;

use refdata_core::banking::{AccountKind, BankAccountDraft, BankDraft};
use refdata_core::catalog::{ParamTypeDraft, ProductDraft, ProductServiceDraft, TypeDefinitionDraft};
use refdata_core::geography::{CityDraft, CountryDraft, CurrencyDraft, MonetaryZoneDraft, RegionDraft};
use refdata_core::organization::{AgencyDraft, SectorDraft};
use refdata_core::taxation::{TaxDraft, TaxKind, TaxRuleDetailDraft};

use crate::error::Result;
use crate::state::AppState;

fn text(value: &str) -> String {
    value.to_string()
}

/// Creates the demo catalogue through the services.
///
/// Returns the number of aggregates created. Morocco and Senegal get
/// regions; France has none, so it can be disabled straight away.
pub async fn seed_demo_data(state: &AppState, cancel: &CancellationToken) -> Result<usize> {
    let mut created = 0;

    // Currencies and monetary zones
    let mad = state
        .currencies
        .create(
            CurrencyDraft {
                code: text("MAD"),
                name: text("Moroccan dirham"),
                symbol: Some(text("DH")),
                decimals: 2,
            },
            cancel,
        )
        .await?
        .aggregate;
    let xof = state
        .currencies
        .create(
            CurrencyDraft {
                code: text("XOF"),
                name: text("West African CFA franc"),
                symbol: Some(text("CFA")),
                decimals: 0,
            },
            cancel,
        )
        .await?
        .aggregate;
    let eur = state
        .currencies
        .create(
            CurrencyDraft {
                code: text("EUR"),
                name: text("Euro"),
                symbol: Some(text("€")),
                decimals: 2,
            },
            cancel,
        )
        .await?
        .aggregate;
    created += 3;

    let uemoa = state
        .monetary_zones
        .create(
            MonetaryZoneDraft {
                code: text("UEMOA"),
                name: text("West African Economic and Monetary Union"),
                currency_id: Some(xof.id),
            },
            cancel,
        )
        .await?
        .aggregate;
    let euro_area = state
        .monetary_zones
        .create(
            MonetaryZoneDraft {
                code: text("EA"),
                name: text("Euro area"),
                currency_id: Some(eur.id),
            },
            cancel,
        )
        .await?
        .aggregate;
    created += 2;

    // Countries, regions and cities
    let countries = [
        ("MA", "Morocco", "MAR", None),
        ("SN", "Senegal", "SEN", Some(uemoa.id)),
        ("FR", "France", "FRA", Some(euro_area.id)),
    ];
    let mut country_ids = Vec::with_capacity(countries.len());
    for (code, name, iso3, zone) in countries {
        let country = state
            .countries
            .create(
                CountryDraft {
                    code: text(code),
                    name: text(name),
                    iso3: Some(text(iso3)),
                    monetary_zone_id: zone,
                },
                cancel,
            )
            .await?
            .aggregate;
        country_ids.push(country.id);
        created += 1;
    }
    let (morocco, senegal) = (country_ids[0], country_ids[1]);

    let regions = [
        (morocco, "04", "Rabat-Salé-Kénitra", &["Rabat", "Salé", "Kénitra"][..]),
        (morocco, "06", "Casablanca-Settat", &["Casablanca", "Settat"][..]),
        (morocco, "60", "Oriental", &["Oujda"][..]),
        (senegal, "DK", "Dakar", &["Dakar", "Rufisque"][..]),
    ];
    let mut city_ids = Vec::new();
    for (country_id, code, name, cities) in regions {
        let region = state
            .regions
            .create(
                RegionDraft {
                    code: text(code),
                    name: text(name),
                    country_id,
                },
                cancel,
            )
            .await?
            .aggregate;
        created += 1;

        for city in cities {
            let city = state
                .cities
                .create(
                    CityDraft {
                        name: text(city),
                        region_id: region.id,
                        postal_code: None,
                    },
                    cancel,
                )
                .await?
                .aggregate;
            city_ids.push(city.id);
            created += 1;
        }
    }

    // Banks and accounts
    let bank = state
        .banks
        .create(
            BankDraft {
                code: text("BCP"),
                name: text("Banque Centrale Populaire"),
                swift_code: Some(text("BCPOMAMC")),
                country_id: Some(morocco),
            },
            cancel,
        )
        .await?
        .aggregate;
    state
        .bank_accounts
        .create(
            BankAccountDraft {
                account_number: text("MA64011519000001205000534921"),
                holder: text("Treasury"),
                kind: AccountKind::Settlement,
                bank_id: bank.id,
                currency_id: Some(mad.id),
            },
            cancel,
        )
        .await?;
    state
        .banks
        .create(
            BankDraft {
                code: text("CBAO"),
                name: text("CBAO Groupe Attijariwafa bank"),
                swift_code: Some(text("CBAOSNDA")),
                country_id: Some(senegal),
            },
            cancel,
        )
        .await?;
    created += 3;

    // Catalog
    let document_type = state
        .type_definitions
        .create(
            TypeDefinitionDraft {
                code: text("DOC_TYPE"),
                label: text("Identity document type"),
            },
            cancel,
        )
        .await?
        .aggregate;
    created += 1;
    for (code, label) in [("CIN", "National identity card"), ("PASS", "Passport")] {
        state
            .param_types
            .create(
                ParamTypeDraft {
                    code: text(code),
                    label: text(label),
                    value: None,
                    type_definition_id: document_type.id,
                },
                cancel,
            )
            .await?;
        created += 1;
    }

    let transfers = state
        .products
        .create(
            ProductDraft {
                code: text("TRANSFER"),
                name: text("Money transfer"),
                description: Some(text("Domestic and international transfers")),
            },
            cancel,
        )
        .await?
        .aggregate;
    state
        .product_services
        .create(
            ProductServiceDraft {
                code: text("TRANSFER_SEPA"),
                name: text("SEPA transfer"),
                product_id: transfers.id,
            },
            cancel,
        )
        .await?;
    created += 2;

    // Organization
    let retail = state
        .sectors
        .create(
            SectorDraft {
                code: text("RETAIL"),
                name: text("Retail banking"),
            },
            cancel,
        )
        .await?
        .aggregate;
    state
        .agencies
        .create(
            AgencyDraft {
                code: text("AG-RBT-01"),
                name: text("Rabat Agdal"),
                address: Some(text("Avenue de France, Agdal")),
                sector_id: retail.id,
                city_id: city_ids.first().copied(),
            },
            cancel,
        )
        .await?;
    created += 2;

    // Taxation
    let vat = state
        .taxes
        .create(
            TaxDraft {
                code: text("VAT"),
                name: text("Value added tax"),
                kind: TaxKind::Vat,
            },
            cancel,
        )
        .await?
        .aggregate;
    created += 1;
    for (code, rate_bps) in [("VAT_STD", 2_000), ("VAT_RED", 1_000)] {
        state
            .tax_rule_details
            .create(
                TaxRuleDetailDraft {
                    code: text(code),
                    rate_bps,
                    description: None,
                    tax_id: vat.id,
                },
                cancel,
            )
            .await?;
        created += 1;
    }

    tracing::info!(created, "Seeded demo reference data");
    Ok(created)
}
