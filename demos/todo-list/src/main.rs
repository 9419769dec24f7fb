//! Todo list demo binary
//!
//! Drives the combined todo reducer through a `Store` and prints each state.

use slicekit_runtime::{Store, StoreConfig};
use std::sync::Arc;
use todo_list::{
    ITEMS, TodoEvent, TodoItems, VISIBILITY, VisibilityFilter, app_reducer, visible_items,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_visible(store: &Store<slicekit_core::CombinedReducer<TodoEvent>>) {
    let filter = store.state_with(|s| s.get::<VisibilityFilter>(VISIBILITY).map(|f| *f));
    println!("Visible ({filter:?}):");
    for item in store.state_with(visible_items) {
        let status = if item.completed { "x" } else { " " };
        println!("  [{status}] {}", item.text);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_list=debug,slicekit_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Todo List Demo ===\n");

    let store = Store::with_config(app_reducer()?, StoreConfig::default().with_name("todo-list"));

    // Watch for changes in the background
    let mut changes = store.subscribe();
    let watcher = tokio::spawn(async move {
        let mut seen = 0_usize;
        while changes.changed().await.is_ok() {
            let state = Arc::clone(&*changes.borrow_and_update());
            let items = state.get::<TodoItems>(ITEMS).map_or(0, |items| items.len());
            tracing::info!(items, "State changed");
            seen += 1;
        }
        seen
    });

    println!("Adding todos...");
    for text in ["Buy milk", "Write documentation", "Deploy to production"] {
        store
            .send(TodoEvent::AddItem {
                text: text.to_string(),
            })
            .await?;
    }
    print_visible(&store);

    println!("\nCompleting 'Buy milk'...");
    store.send(TodoEvent::CompleteItem { index: 0 }).await?;

    println!("Completing it again (no change)...");
    let dispatched = store.send(TodoEvent::CompleteItem { index: 0 }).await?;
    println!("Changed: {}", dispatched.changed);

    println!("\nShowing active todos...");
    store
        .send(TodoEvent::SetVisibility {
            filter: VisibilityFilter::Active,
        })
        .await?;
    print_visible(&store);

    println!("\nClearing completed...");
    store.send(TodoEvent::ClearCompleted).await?;
    store
        .send(TodoEvent::SetVisibility {
            filter: VisibilityFilter::All,
        })
        .await?;
    print_visible(&store);

    store.shutdown();
    drop(store);
    let seen = watcher.await?;
    println!("\nWatcher saw {seen} change notification(s)");

    println!("\n=== Demo Complete ===");
    Ok(())
}
