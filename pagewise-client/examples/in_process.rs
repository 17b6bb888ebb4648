// Example: drive a list against an in-process store, no HTTP involved.
use pagewise::{CollectionStore, StateService};
use pagewise_client::{ListController, ListOptions, MemoryStore, RowSlot};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service = StateService::new(CollectionStore::with_len(1_000_000));
    let mut list = ListController::new(service.clone(), MemoryStore::new(), ListOptions::default());
    list.on_viewport_size(700);
    list.initialize(0).await?;
    println!("rows={} extent={}", list.rows().count(), list.rows().total_size());

    // Jump far down; the trigger fetches the page under the viewport.
    list.on_scroll(35 * 500_000);
    while let Some(outcome) = list.sync(1).await? {
        println!("fetched {outcome:?}");
    }
    for row in list.visible_rows().iter().take(3) {
        if let RowSlot::Item { index, item, .. } = row {
            println!("row {index}: id={}", item.id);
        }
    }

    // Reorders act on the rows loaded from the top, not the jumped-to page.
    list.on_scroll(0);
    list.drop_item(0, 3).await?;
    list.toggle(2).await?;
    println!("saved state: {:?}", {
        let state = service.state();
        (state.order.len(), state.selected)
    });
    Ok(())
}
