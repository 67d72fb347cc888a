/// A consumer of raw log lines, fed in log order.
pub trait Analyzer {
    fn process(&mut self, line: &str);
    fn finish(&mut self);
}
