use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use flagbot::events::RecordingSink;
use flagbot::models::{Fill, Order, OrderSide, Trade, TradeSide};
use flagbot::strategy::RoundTripStatus;
use flagbot::{Clock, Engine, EngineConfig};

fn at(m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, m, s).unwrap()
}

fn trade(time: DateTime<Utc>, price: f64) -> Trade {
    Trade {
        id: format!("t-{}", time.timestamp()),
        symbol: "BTC-USD".to_string(),
        side: TradeSide::Buy,
        price,
        quantity: 1.0,
        transaction_time: time,
    }
}

fn fill_for(order: &Order, price: f64, time: DateTime<Utc>) -> Fill {
    Fill {
        order_id: order.client_order_id,
        side: order.side,
        price,
        quantity: order.quantity,
        transaction_time: time,
    }
}

fn config() -> EngineConfig {
    EngineConfig {
        atr_period: 3,
        score_cutoff: 0.4,
        min_order_quantity: 1.0,
        ..EngineConfig::default()
    }
}

/// Replay-style driver: pin the clock to the trade's timestamp, then
/// dispatch, exactly as a live feed would experience wall-clock time.
fn feed(
    engine: &mut Engine<RecordingSink>,
    clock: &Clock,
    time: DateTime<Utc>,
    price: f64,
) -> Vec<Order> {
    clock.use_fake_time("e2e", time).unwrap();
    engine.on_trade(&trade(time, price)).unwrap()
}

#[test]
fn test_bull_flag_round_trip_lifecycle() {
    let clock = Arc::new(Clock::new());
    clock.claim_admin("e2e").unwrap();
    let mut engine = Engine::new(&config(), clock.clone(), RecordingSink::new()).unwrap();

    // Minute 0: baseline candle. Minute 1: extreme bullish flag.
    // Minute 2: tight consolidation.
    let mut orders = Vec::new();
    orders.extend(feed(&mut engine, &clock, at(0, 5), 100.0));
    orders.extend(feed(&mut engine, &clock, at(0, 30), 101.0));
    orders.extend(feed(&mut engine, &clock, at(1, 5), 101.0));
    orders.extend(feed(&mut engine, &clock, at(1, 30), 111.0));
    orders.extend(feed(&mut engine, &clock, at(2, 5), 111.0));
    orders.extend(feed(&mut engine, &clock, at(2, 30), 111.5));
    assert!(orders.is_empty(), "no order before the consolidation completes");

    // Minute 3 opens: the pattern is detectable, exactly one buy goes out
    let buys = feed(&mut engine, &clock, at(3, 5), 111.5);
    assert_eq!(buys.len(), 1);
    let buy = &buys[0];
    assert_eq!(buy.side, OrderSide::Buy);
    assert!(buy.price.is_none(), "entry is a market order");
    assert_eq!(buy.creation_time, at(3, 5));

    assert_eq!(engine.sink().bull_flags.len(), 1);
    assert_eq!(engine.sink().opportunities.len(), 1);
    let profit_price = engine.sink().opportunities[0].profit_price;
    assert!(profit_price > 111.5);

    // More consolidation trades detect nothing new (idempotency on the
    // pattern's start time) and trigger no exit before a buy fill exists
    assert!(feed(&mut engine, &clock, at(3, 20), 111.4).is_empty());

    engine.on_fill(&fill_for(buy, 111.5, at(3, 21)));
    assert_eq!(engine.round_trips().len(), 1);
    assert_eq!(engine.round_trips()[0].status(), RoundTripStatus::BuyFilled);

    // Price rips through the profit target: exactly one sell, same trip
    let sells = feed(&mut engine, &clock, at(3, 40), profit_price + 1.0);
    assert_eq!(sells.len(), 1);
    let sell = &sells[0];
    assert_eq!(sell.side, OrderSide::Sell);
    assert_eq!(sell.quantity, buy.quantity);
    assert_eq!(engine.round_trips()[0].status(), RoundTripStatus::SellSent);

    // No duplicate sell on further candles
    assert!(feed(&mut engine, &clock, at(3, 50), profit_price + 2.0).is_empty());

    // Matching sell fill closes the round trip and emits one trade result
    assert!(engine.sink().trade_results.is_empty());
    engine.on_fill(&fill_for(sell, profit_price + 1.0, at(3, 55)));

    let results = &engine.sink().trade_results;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status(), RoundTripStatus::Closed);
    assert_eq!(results[0].filled_buy_quantity(), buy.quantity);
    assert_eq!(results[0].filled_sell_quantity(), sell.quantity);
}

#[test]
fn test_stop_loss_path() {
    let clock = Arc::new(Clock::new());
    clock.claim_admin("e2e").unwrap();
    let mut engine = Engine::new(&config(), clock.clone(), RecordingSink::new()).unwrap();

    feed(&mut engine, &clock, at(0, 5), 100.0);
    feed(&mut engine, &clock, at(0, 30), 101.0);
    feed(&mut engine, &clock, at(1, 5), 101.0);
    feed(&mut engine, &clock, at(1, 30), 111.0);
    feed(&mut engine, &clock, at(2, 5), 111.0);
    feed(&mut engine, &clock, at(2, 30), 111.5);

    let buys = feed(&mut engine, &clock, at(3, 5), 111.5);
    assert_eq!(buys.len(), 1);
    engine.on_fill(&fill_for(&buys[0], 111.5, at(3, 6)));

    let stop = engine.sink().opportunities[0].stop_loss_price;
    let sells = feed(&mut engine, &clock, at(3, 30), stop - 0.5);
    assert_eq!(sells.len(), 1);
    assert_eq!(sells[0].side, OrderSide::Sell);

    engine.on_fill(&fill_for(&sells[0], stop - 0.5, at(3, 31)));
    assert_eq!(engine.sink().trade_results.len(), 1);
}

#[test]
fn test_shooting_star_forces_exit() {
    let clock = Arc::new(Clock::new());
    clock.claim_admin("e2e").unwrap();
    let mut engine = Engine::new(&config(), clock.clone(), RecordingSink::new()).unwrap();

    feed(&mut engine, &clock, at(0, 5), 100.0);
    feed(&mut engine, &clock, at(0, 30), 101.0);
    feed(&mut engine, &clock, at(1, 5), 101.0);
    feed(&mut engine, &clock, at(1, 30), 111.0);
    feed(&mut engine, &clock, at(2, 5), 111.0);
    feed(&mut engine, &clock, at(2, 30), 111.5);

    let buys = feed(&mut engine, &clock, at(3, 5), 111.5);
    assert_eq!(buys.len(), 1);
    engine.on_fill(&fill_for(&buys[0], 111.5, at(3, 6)));

    // Minute 3 becomes a shooting star: small body between the profit and
    // stop prices, long upper spike, hairline lower wick
    feed(&mut engine, &clock, at(3, 20), 111.65);
    feed(&mut engine, &clock, at(3, 40), 111.43);
    feed(&mut engine, &clock, at(3, 50), 111.44);

    // Minute 4 opens, completing the star; the exit is price-independent
    let sells = feed(&mut engine, &clock, at(4, 5), 111.44);
    assert_eq!(engine.sink().shooting_stars.len(), 1);
    assert_eq!(sells.len(), 1);
    assert_eq!(sells[0].side, OrderSide::Sell);

    engine.on_fill(&fill_for(&sells[0], 111.44, at(4, 6)));
    assert_eq!(engine.sink().trade_results.len(), 1);
    assert_eq!(engine.sink().trade_results[0].status(), RoundTripStatus::Closed);
}
