//! End-to-end checkout scenarios.
//!
//! Each test drives the public API the way the storefront shell would: load
//! the cart, resolve prices against the promotion set, walk the wizard,
//! estimate the delivery fee, then submit through the two-phase order
//! service. External services are mockall doubles.

use jiff::Timestamp;
use testresult::TestResult;

use cabas::{
    delivery::client::MockDeliveryRateService,
    order::client::MockOrderGateway,
    prelude::*,
    promotions::feed::MockPromotionsFeed,
};

fn now() -> Timestamp {
    Timestamp::UNIX_EPOCH
}

fn contact() -> ContactInfo {
    ContactInfo {
        name: "Amel Ben Salah".to_owned(),
        phone: "21612345678".to_owned(),
        email: Some("amel@example.tn".to_owned()),
    }
}

fn home_delivery() -> DeliverySelection {
    DeliverySelection::Home {
        mode_id: Some(1),
        address: Some(Address {
            street: "12 avenue Habib Bourguiba".to_owned(),
            city: "Tunis".to_owned(),
            region: "Tunis".to_owned(),
            postal_code: Some("1000".to_owned()),
        }),
        coordinates: None,
    }
}

fn walk_to_review(wizard: &mut CheckoutWizard) -> Result<(), ValidationError> {
    wizard.advance()?;
    wizard.advance()?;
    wizard.advance()?;

    Ok(())
}

/// Scenario A: subtotal 250.000 DT, balance 50.000 DT, full balance
/// requested, home delivery fee 7.000 DT.
#[tokio::test]
async fn full_balance_deduction_with_delivery_fee() -> TestResult {
    let mut cart = CartStore::load(MemoryStore::new(), now())?;

    let product = Product::new("p-1", "Panier garni", millimes(125_000));
    let resolved = resolve(&product, &[], now());
    cart.add(&product, &resolved, 2, now())?;
    cart.set_use_cagnotte(true)?;

    let mut session = Session::new("client-1", "token", millimes(50_000));
    let snapshot = cart.snapshot(session.cagnotte_balance());

    assert_eq!(snapshot.subtotal.to_minor_units(), 250_000);
    assert_eq!(snapshot.cagnotte_applied.to_minor_units(), 50_000);

    // Fee estimation for the chosen address.
    let mut rates = MockDeliveryRateService::new();
    rates
        .expect_quote()
        .times(1)
        .returning(|_| Ok(millimes(7_000)));
    let mut estimator = FeeEstimator::new(rates);

    let selection = home_delivery();
    let fee = estimator
        .refresh(&selection, snapshot.subtotal, cart.items(), now())
        .await
        .ok_or("expected a fee")?;

    let mut wizard = CheckoutWizard::begin(snapshot);
    wizard.draft_mut().contact = contact();
    wizard.draft_mut().delivery = Some(selection);
    wizard.draft_mut().delivery_fee = fee;
    walk_to_review(&mut wizard)?;

    assert_eq!(wizard.draft().total_payable().to_minor_units(), 207_000);

    let mut gateway = MockOrderGateway::new();
    gateway.expect_prepare().times(1).returning(|_, order| {
        assert_eq!(order.total_amount, 207_000);

        Ok(PreparedTotals {
            total_amount: millimes(207_000),
            delivery_fee: millimes(7_000),
            cagnotte_deduction: millimes(50_000),
        })
    });
    gateway.expect_place().times(1).returning(|_, _| {
        Ok(cabas::order::PlacedOrder {
            order_id: "o-100".to_owned(),
        })
    });

    let mut promotions = PromotionCache::default();
    let reconciler = OrderReconciler::new(gateway);

    let confirmation = reconciler
        .submit(&mut wizard, &mut cart, &mut session, &mut promotions)
        .await?;

    assert_eq!(confirmation.server_total.to_minor_units(), 207_000);
    assert_eq!(session.cagnotte_balance().to_minor_units(), 0);
    assert!(cart.items().is_empty());

    Ok(())
}

/// Scenario B: subtotal 20.000 DT, balance 50.000 DT, pickup (zero fee):
/// the deduction is capped by the subtotal and the total reaches zero.
#[tokio::test]
async fn deduction_capped_by_subtotal_on_pickup() -> TestResult {
    let mut cart = CartStore::load(MemoryStore::new(), now())?;

    let product = Product::new("p-2", "Anchois 500g", millimes(20_000));
    let resolved = resolve(&product, &[], now());
    cart.add(&product, &resolved, 1, now())?;
    cart.set_use_cagnotte(true)?;

    let session = Session::new("client-1", "token", millimes(50_000));
    let snapshot = cart.snapshot(session.cagnotte_balance());

    assert_eq!(snapshot.cagnotte_applied.to_minor_units(), 20_000);

    // Pickup short-circuits the rate service entirely.
    let rates = MockDeliveryRateService::new();
    let mut estimator = FeeEstimator::new(rates);

    let selection = DeliverySelection::Pickup {
        store_id: Some("store-7".to_owned()),
    };
    let fee = estimator
        .refresh(&selection, snapshot.subtotal, cart.items(), now())
        .await
        .ok_or("expected a fee")?;

    assert_eq!(fee.to_minor_units(), 0);

    let mut wizard = CheckoutWizard::begin(snapshot);
    wizard.draft_mut().contact = contact();
    wizard.draft_mut().delivery = Some(selection);
    wizard.draft_mut().delivery_fee = fee;
    walk_to_review(&mut wizard)?;

    assert_eq!(wizard.draft().total_payable().to_minor_units(), 0);

    Ok(())
}

/// Scenario C: list price 100.000 DT, promotion at 80.000 DT, quantity 2.
#[tokio::test]
async fn promotional_price_flows_into_the_cart() -> TestResult {
    let mut feed = MockPromotionsFeed::new();
    feed.expect_promotions().times(1).returning(|_| {
        Ok(vec![PromotionRecord {
            promo_id: "promo-1".to_owned(),
            product_id: "p-3".to_owned(),
            original_price: millimes(100_000),
            promo_price: millimes(80_000),
            discount_percent: None,
            valid_from: None,
            valid_to: None,
        }])
    });

    let mut promotions = PromotionCache::default();
    let records = active_promotions(&mut promotions, &feed, "client-1", now()).await;

    let product = Product::new("p-3", "Huile d'olive 5L", millimes(100_000));
    let resolved = resolve(&product, &records, now());

    assert!(resolved.is_promotion);
    assert_eq!(resolved.unit_price.to_minor_units(), 80_000);
    assert_eq!(resolved.discount_percent, rust_decimal::Decimal::from(20));

    let mut cart = CartStore::load(MemoryStore::new(), now())?;
    let item = cart.add(&product, &resolved, 2, now())?;

    assert_eq!(item.line_total().to_minor_units(), 160_000);
    assert!(item.is_promotion());
    assert_eq!(item.promo_id(), Some("promo-1"));

    Ok(())
}

/// Scenario D: a promotion expires between cart load and checkout, so the
/// server's prepared total (215.500) differs from the client estimate
/// (207.000). Placement and confirmation must both carry the server total.
#[tokio::test]
async fn server_confirmed_total_supersedes_client_estimate() -> TestResult {
    let mut cart = CartStore::load(MemoryStore::new(), now())?;

    let product = Product::new("p-1", "Panier garni", millimes(125_000));
    let resolved = resolve(&product, &[], now());
    cart.add(&product, &resolved, 2, now())?;
    cart.set_use_cagnotte(true)?;

    let mut session = Session::new("client-1", "token", millimes(50_000));
    let snapshot = cart.snapshot(session.cagnotte_balance());

    let mut wizard = CheckoutWizard::begin(snapshot);
    wizard.draft_mut().contact = contact();
    wizard.draft_mut().delivery = Some(home_delivery());
    wizard.draft_mut().delivery_fee = millimes(7_000);
    walk_to_review(&mut wizard)?;

    assert_eq!(wizard.draft().total_payable().to_minor_units(), 207_000);

    let mut gateway = MockOrderGateway::new();
    gateway.expect_prepare().times(1).returning(|_, _| {
        Ok(PreparedTotals {
            total_amount: millimes(215_500),
            delivery_fee: millimes(7_000),
            cagnotte_deduction: millimes(50_000),
        })
    });
    gateway.expect_place().times(1).returning(|_, order| {
        assert_eq!(
            order.total_amount, 215_500,
            "place must carry the server-confirmed total"
        );

        Ok(cabas::order::PlacedOrder {
            order_id: "o-200".to_owned(),
        })
    });

    let mut promotions = PromotionCache::default();
    let reconciler = OrderReconciler::new(gateway);

    let confirmation = reconciler
        .submit(&mut wizard, &mut cart, &mut session, &mut promotions)
        .await?;

    assert_eq!(
        confirmation.server_total.to_minor_units(),
        215_500,
        "the confirmation shows the server total, not the stale estimate"
    );

    Ok(())
}

/// The persisted cart survives a reload, exactly as a returning visitor
/// sees it, and the cagnotte flag comes back with it.
#[test]
fn cart_survives_a_reload_within_seven_days() -> TestResult {
    let mut store = MemoryStore::new();

    {
        let mut cart = CartStore::load(&mut store, now())?;
        let product = Product::new("p-1", "Panier garni", millimes(125_000));
        let resolved = resolve(&product, &[], now());
        cart.add(&product, &resolved, 2, now())?;
        cart.set_use_cagnotte(true)?;
    }

    let reloaded = CartStore::load(&mut store, now())?;

    let item = reloaded.items().first().ok_or("cart came back empty")?;
    assert_eq!(item.quantity(), 2);
    assert!(reloaded.use_cagnotte());

    Ok(())
}
