use shared::models::predicate::{IfThis, Network, NetworkPredicate, Predicate, ThenThat};

pub const LIST_METHOD: &str = "list-nft";
pub const BUY_METHOD: &str = "buy-nft";
pub const OFFER_METHOD: &str = "make-offer";
pub const PLATFORM_FEE_MARKER: &str = "platform-fee";

/// Marketplace occurrences the listener subscribes to. Each one maps to a
/// predicate and to its own callback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketplaceEvent {
    Listing,
    Sale,
    Offer,
    Fees,
}

impl MarketplaceEvent {
    pub const ALL: [MarketplaceEvent; 4] = [
        MarketplaceEvent::Listing,
        MarketplaceEvent::Sale,
        MarketplaceEvent::Offer,
        MarketplaceEvent::Fees,
    ];

    pub fn predicate_name(&self) -> &'static str {
        match self {
            MarketplaceEvent::Listing => "nft-listing-events",
            MarketplaceEvent::Sale => "nft-sale-events",
            MarketplaceEvent::Offer => "nft-offer-events",
            MarketplaceEvent::Fees => "platform-fees-events",
        }
    }

    pub fn path_segment(&self) -> &'static str {
        match self {
            MarketplaceEvent::Listing => "listing",
            MarketplaceEvent::Sale => "sale",
            MarketplaceEvent::Offer => "offer",
            MarketplaceEvent::Fees => "fees",
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|event| event.path_segment() == segment)
    }

    fn condition(&self, contract_identifier: &str) -> IfThis {
        let contract_call = |method: &str| IfThis::ContractCall {
            contract_identifier: contract_identifier.to_string(),
            method: method.to_string(),
        };
        match self {
            MarketplaceEvent::Listing => contract_call(LIST_METHOD),
            MarketplaceEvent::Sale => contract_call(BUY_METHOD),
            MarketplaceEvent::Offer => contract_call(OFFER_METHOD),
            MarketplaceEvent::Fees => IfThis::PrintEvent {
                contract_identifier: contract_identifier.to_string(),
                contains: PLATFORM_FEE_MARKER.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredicateSettings {
    pub contract_identifier: String,
    pub external_base_url: String,
    pub auth_token: String,
    pub start_block: u64,
    pub network: Network,
}

impl PredicateSettings {
    pub fn callback_url(&self, event: MarketplaceEvent) -> String {
        format!(
            "{}/chainhook/{}",
            self.external_base_url.trim_end_matches('/'),
            event.path_segment()
        )
    }
}

pub fn build_predicates(settings: &PredicateSettings) -> Vec<Predicate> {
    MarketplaceEvent::ALL
        .iter()
        .map(|event| {
            Predicate::new(
                event.predicate_name(),
                settings.network,
                NetworkPredicate {
                    if_this: event.condition(&settings.contract_identifier),
                    then_that: ThenThat::http_post(
                        settings.callback_url(*event),
                        &settings.auth_token,
                    ),
                    start_block: settings.start_block,
                },
            )
        })
        .collect()
}
