mod test_health;
