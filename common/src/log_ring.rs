use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct LogRing {
    entries: VecDeque<String>,
    capacity: usize,
}

impl LogRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, text: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(text.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(String::as_str)
    }

    pub fn text(&self) -> String {
        self.entries().fold(String::new(), |mut out, line| {
            out.push_str(line);
            out.push('\n');
            out
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn evicts_oldest_when_full() {
        let mut ring = LogRing::new(3);
        for n in 1..=4 {
            ring.push(format!("entry {n}"));
        }

        assert_eq!(ring.len(), 3);
        assert_eq!(
            ring.entries().collect::<Vec<_>>(),
            vec!["entry 2", "entry 3", "entry 4"]
        );
    }

    #[test]
    fn text_is_oldest_first_and_restartable() {
        let mut ring = LogRing::new(80);
        ring.push("boot");
        ring.push("rate -> 16000");

        assert_eq!(ring.text(), "boot\nrate -> 16000\n");
        ring.push("reboot scheduled");
        assert_eq!(ring.entries().count(), 3);
        assert_eq!(ring.entries().next(), Some("boot"));
    }

    #[test]
    fn order_survives_many_wraps() {
        let mut ring = LogRing::new(80);
        for n in 0..250 {
            ring.push(n.to_string());
        }

        let kept: Vec<_> = ring.entries().map(|s| s.parse::<u32>().unwrap()).collect();
        assert_eq!(kept, (170..250).collect::<Vec<_>>());
    }
}
