fn main() {
    symptom_engine::run()
}
