fn main() {
    uniffi::generate_scaffolding("src/webpush_core.udl").expect("failed to generate UniFFI scaffolding");
}
