use rust_decimal::Decimal;

use crate::models::request::ServiceTier;

// Base price per tier. Quotes charge the base once per started distance
// bracket, with a minimum of one bracket so a zero or unknown distance
// still bills the base price.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    pub short_haul: Decimal,
    pub van_parcel: Decimal,
    pub pickup_freight: Decimal,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            short_haul: Decimal::from(5_000),
            van_parcel: Decimal::from(10_000),
            pickup_freight: Decimal::from(20_000),
        }
    }
}

impl PriceTable {
    pub fn base(&self, tier: ServiceTier) -> Decimal {
        match tier {
            ServiceTier::ShortHaul => self.short_haul,
            ServiceTier::VanParcel => self.van_parcel,
            ServiceTier::PickupFreight => self.pickup_freight,
        }
    }

    pub fn estimate(&self, tier: ServiceTier, distance_km: Option<f64>) -> Decimal {
        let distance = distance_km.unwrap_or(0.0).max(0.0);
        let brackets = (distance / bracket_km(tier)).ceil().max(1.0);
        self.base(tier) * Decimal::from(brackets as u64)
    }
}

fn bracket_km(tier: ServiceTier) -> f64 {
    match tier {
        ServiceTier::ShortHaul => 2.0,
        ServiceTier::VanParcel | ServiceTier::PickupFreight => 10.0,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::PriceTable;
    use crate::models::request::ServiceTier;

    fn price(tier: ServiceTier, distance_km: f64) -> Decimal {
        PriceTable::default().estimate(tier, Some(distance_km))
    }

    #[test]
    fn short_haul_bills_base_per_started_2km() {
        assert_eq!(price(ServiceTier::ShortHaul, 0.0), Decimal::from(5_000));
        assert_eq!(price(ServiceTier::ShortHaul, 2.0), Decimal::from(5_000));
        assert_eq!(price(ServiceTier::ShortHaul, 2.1), Decimal::from(10_000));
        assert_eq!(price(ServiceTier::ShortHaul, 3.0), Decimal::from(10_000));
        assert_eq!(price(ServiceTier::ShortHaul, 4.0), Decimal::from(10_000));
        assert_eq!(price(ServiceTier::ShortHaul, 4.5), Decimal::from(15_000));
    }

    #[test]
    fn van_parcel_is_flat_up_to_10km() {
        assert_eq!(price(ServiceTier::VanParcel, 0.0), Decimal::from(10_000));
        assert_eq!(price(ServiceTier::VanParcel, 9.9), Decimal::from(10_000));
        assert_eq!(price(ServiceTier::VanParcel, 10.0), Decimal::from(10_000));
        assert_eq!(price(ServiceTier::VanParcel, 10.1), Decimal::from(20_000));
        assert_eq!(price(ServiceTier::VanParcel, 25.0), Decimal::from(30_000));
    }

    #[test]
    fn pickup_freight_bills_base_per_started_10km() {
        assert_eq!(price(ServiceTier::PickupFreight, 10.0), Decimal::from(20_000));
        assert_eq!(price(ServiceTier::PickupFreight, 21.0), Decimal::from(60_000));
    }

    #[test]
    fn unknown_distance_falls_back_to_base() {
        let table = PriceTable::default();
        for tier in [
            ServiceTier::ShortHaul,
            ServiceTier::VanParcel,
            ServiceTier::PickupFreight,
        ] {
            assert_eq!(table.estimate(tier, None), table.base(tier));
        }
    }

    #[test]
    fn negative_distance_is_treated_as_zero() {
        assert_eq!(price(ServiceTier::ShortHaul, -3.0), Decimal::from(5_000));
    }

    #[test]
    fn price_never_decreases_with_distance() {
        let table = PriceTable::default();
        for tier in [
            ServiceTier::ShortHaul,
            ServiceTier::VanParcel,
            ServiceTier::PickupFreight,
        ] {
            let mut previous = Decimal::ZERO;
            for step in 0..200 {
                let estimate = table.estimate(tier, Some(step as f64 * 0.5));
                assert!(estimate >= previous, "price dropped for {tier} at step {step}");
                assert!(estimate >= table.base(tier));
                previous = estimate;
            }
        }
    }

    #[test]
    fn custom_base_scales_every_bracket() {
        let table = PriceTable {
            short_haul: Decimal::from(7_500),
            ..PriceTable::default()
        };
        assert_eq!(
            table.estimate(ServiceTier::ShortHaul, Some(5.0)),
            Decimal::from(22_500)
        );
    }
}
