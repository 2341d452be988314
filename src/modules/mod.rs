pub mod allocation;
pub mod exams;
pub mod grades;
pub mod terms;

#[cfg(test)]
pub mod testing;
