//! Simuliert eine Swipe-Sitzung: Likes für Pizza, Dislikes für Burger.
//!
//! Run with: cargo run -p nextplace-bandits --example session

use nextplace_bandits::QAgent;
use nextplace_core::Policy;

fn main() {
    let mut agent = QAgent::seeded(0.1, 0.9, 7);
    let places = ["tonys-pizza", "big-burger", "boba-corner", "slice-pizza"];

    for round in 0..20 {
        for place in places {
            let reward = if place.contains("burger") { -1.0 } else { 1.0 };
            agent.feedback("downtown", place, reward, place);
        }
        if round % 5 == 4 {
            match agent.decide("downtown") {
                Some(d) => println!("round {round:>2}: {} ({}, q={:.3})", d.action.id, d.why, d.score),
                None => println!("round {round:>2}: no action"),
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&agent.snapshot()).unwrap_or_default());
}
