use crosswalk_rs::{
    CrosswalkConfig, EntityKey, LinkQuality, Pipeline, ProviderKind, ReferenceSegment, SecurityKey,
};
use crosswalk_rs::config::ProviderConfig;
use time::macros::date;

/// Security master with one listed common share (cusip 037833, ticker AAPL).
#[allow(dead_code)]
pub fn listed_issuer() -> Vec<ReferenceSegment> {
    vec![ReferenceSegment::new(
        EntityKey::new("GVK123"),
        SecurityKey::new("PERM1"),
        date!(2015 - 01 - 01),
        Some(date!(2099 - 01 - 01)),
    )
    .with_cusip6("037833")
    .with_ticker("AAPL")
    .with_common(true)
    .with_exchange("NASDAQ")
    .with_link_quality(LinkQuality::PRIMARY)]
}

/// One security handed from one entity key to another on 2010-01-01.
#[allow(dead_code)]
pub fn corporate_action() -> Vec<ReferenceSegment> {
    vec![
        ReferenceSegment::new(
            EntityKey::new("2001"),
            SecurityKey::new("30003"),
            date!(2000 - 01 - 01),
            Some(date!(2010 - 01 - 01)),
        )
        .with_cusip6("222222")
        .with_ticker("OLDCO"),
        ReferenceSegment::new(
            EntityKey::new("2002"),
            SecurityKey::new("30003"),
            date!(2010 - 01 - 01),
            None,
        )
        .with_cusip6("222222")
        .with_ticker("NEWCO"),
    ]
}

/// Default configuration plus a `custom` provider that uses every identifier.
#[allow(dead_code)]
pub fn config_with_custom() -> CrosswalkConfig {
    let mut config = CrosswalkConfig::default();
    config
        .providers
        .push(ProviderConfig::new("custom", ProviderKind::Custom));
    config
}

#[allow(dead_code)]
pub fn pipeline() -> Pipeline {
    Pipeline::new(config_with_custom()).expect("valid config")
}
