// Example: a million fixed-height rows, scrolled to the bottom.
use pagewise_virtual::{Align, RowOptions, RowVirtualizer};

fn main() {
    let mut v = RowVirtualizer::new(RowOptions::fixed(1_000_000, 35));
    v.set_viewport_and_scroll(700, 123_456);

    let mut rows = Vec::new();
    v.collect_virtual_rows(&mut rows);
    println!("total_size={}", v.total_size());
    println!("virtual_range={:?}", v.virtual_range());
    println!("first_rendered={:?}", rows.first());

    // A trailing "loading" row, then gone again.
    v.set_count(1_000_001);
    println!("with placeholder: total_size={}", v.total_size());
    v.set_count(1_000_000);

    let off = v.scroll_to_index_offset(999_999, Align::End);
    v.set_scroll_offset_clamped(off);
    println!("after scroll_to_index: offset={}", v.scroll_offset());
}
