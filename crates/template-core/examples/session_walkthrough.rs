use template_core::{AcceptedSet, CaretPosition, HeadlessView, TemplateSession, ViewAdapter};

fn main() {
    println!("=== template-core session walkthrough ===\n");

    let accepted = AcceptedSet::new(["Company Name", "Agent Name", "First Name", "Last Name"])
        .expect("valid placeholder names");
    let mut session = TemplateSession::with_accepted(accepted, "Hello [First Name],");

    session.subscribe(|change| {
        if let Some(value) = &change.value {
            println!("  v{} value: {value}", change.new_version);
        }
    });

    println!("1. Typing after the placeholder promotes accepted names:");
    session.type_text(" this is Agent Name");
    println!("   runs: {:?}\n", session.document().runs());

    println!("2. Inserting a placeholder at a saved caret:");
    session.set_caret(CaretPosition::new(0, 5));
    session.insert_placeholder("Company Name");
    println!("   runs: {:?}\n", session.document().runs());

    println!("3. Backspacing into a placeholder decays it into text:");
    session.move_end();
    session.backspace();
    println!("   runs: {:?}\n", session.document().runs());

    println!("4. Projecting onto a headless view:");
    let mut view = HeadlessView::new();
    let handle = session.render_into(&mut view);
    for span in &view.snapshot().spans {
        println!("   {:?} {:?} at {:?}", span.kind, span.display, span.columns);
    }
    println!("   caret anchor: {:?}", view.current_caret(&handle));

    println!("\nFinal value: {}", session.value());
}
